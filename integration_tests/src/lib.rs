//! Scenario-level tests for the structure index live under `tests/`.
