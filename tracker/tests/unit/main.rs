//! Tracker integration tests

mod test_resolver;
mod test_tracker;
