mod coverage;
mod grammar;
mod lint;
mod recommend;
mod test_output;

pub use coverage::parse_coverage;
pub use grammar::normalize_line;
pub use lint::parse_lint;
pub use recommend::recommend;
pub use test_output::{parse_tests, GO_TEST, JEST, PYTEST};
