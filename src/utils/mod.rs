// Browser utility modules
pub mod constants;
mod timeout;
mod wait_for_element;

pub use timeout::{
    MAX_LAUNCH_TIMEOUT_MS, MAX_NAVIGATION_TIMEOUT_MS, validate_launch_timeout,
    validate_navigation_timeout,
};
pub use wait_for_element::wait_for_selector;
