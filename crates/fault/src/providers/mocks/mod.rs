//! Mock implementations of the [crate::OutputSource] and [crate::TraceOracle] traits for testing.

mod mock_output;
pub use self::mock_output::MockOutputSource;

mod mock_oracle;
pub use self::mock_oracle::MockTraceOracle;
