/// One-shot pull request analysis command
pub mod analyze;
