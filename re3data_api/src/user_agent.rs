/// User agent sent with every request. The registry asks harvesters to identify themselves.
pub fn get_user_agent() -> String {
    format!(
        "re3data-harvester/{} (+https://www.re3data.org/api/doc)",
        env!("CARGO_PKG_VERSION")
    )
}
