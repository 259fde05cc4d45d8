pub mod assertions;
pub mod fixtures;
pub mod logging;

pub use assertions::{assert_contains, assert_exit_code, assert_launcher_failure};
pub use fixtures::TestBundle;
pub use logging::init_test_logging;
