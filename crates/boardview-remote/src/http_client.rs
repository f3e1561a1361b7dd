use std::time::Duration;

use reqwest::Client;

const DISABLE_SYSTEM_PROXY_ENV: &str = "BOARDVIEW_DISABLE_SYSTEM_PROXY";

pub(crate) fn build_http_client(timeout: Duration) -> reqwest::Result<Client> {
    let builder = Client::builder().timeout(timeout);
    if should_disable_system_proxy() {
        builder.no_proxy().build()
    } else {
        builder.build()
    }
}

fn should_disable_system_proxy() -> bool {
    if std::env::var_os(DISABLE_SYSTEM_PROXY_ENV).is_some() {
        return true;
    }

    cfg!(test)
}
