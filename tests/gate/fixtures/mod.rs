// tests/gate/fixtures/mod.rs
