#![allow(dead_code, unused_imports)]

pub use cascade_test_utils::builders;
pub use cascade_test_utils::fake_executor;
pub use cascade_test_utils::{init_tracing, run_graph, with_timeout};
