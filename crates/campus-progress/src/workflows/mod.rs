pub mod assessments;
pub mod hierarchy;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;
