use super::*;

#[test]
fn init_twice_is_harmless() {
    init_tracing();
    init_tracing();
    tracing::info!("subscriber installed");
}
