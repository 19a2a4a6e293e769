//! Test-only crate; the latency smoke guardrail lives under `tests/`.
