//! Test-only crate; the contract validation suite lives under `tests/`.
