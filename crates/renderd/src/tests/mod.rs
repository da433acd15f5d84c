//! Test suites for the render service.

mod support;
