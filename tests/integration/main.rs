//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises one component against
//! the scripted port mocks in `mock_hw`.  All tests run on the host with no
//! real hardware required.

mod device_tests;
mod sensor_tests;
mod telemetry_tests;
