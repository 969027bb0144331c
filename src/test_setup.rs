#[cfg(test)]
#[ctor::ctor]
fn init_tests() {
    // tracing forwards to `log`, so RUST_LOG controls the test output
    let _ = env_logger::builder().is_test(true).try_init();
}
