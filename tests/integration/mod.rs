//! Integration tests driving governed bodies through real executors

mod multi_thread;
mod scenarios;
mod test_utils;
