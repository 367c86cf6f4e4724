pub mod provider_stub;
