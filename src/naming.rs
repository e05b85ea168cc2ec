//! Name-generation helper (C10): pure derivation of canonical actor/service/
//! endpoint names from an interface type name.
//!
//! Nothing here touches the table's concurrency machinery; it is included
//! because the external interface explicitly names it as part of the
//! system's surface, not because the table needs it internally.

/// Default service-package name prefix.
pub const DEFAULT_SERVICE_PACKAGE_PREFIX: &str = "FabricActorService";
/// Default application name prefix.
pub const DEFAULT_APPLICATION_PREFIX: &str = "FabricActorApp";
/// Code package name within a service package.
pub const CODE_PACKAGE_NAME: &str = "Code";
/// Config package name within a service package.
pub const CONFIG_PACKAGE_NAME: &str = "Config";
/// Configuration key naming the credential type in use.
pub const CREDENTIAL_TYPE_KEY: &str = "CredentialType";
/// Configuration section for overriding the state provider.
pub const STATE_PROVIDER_OVERRIDE_SECTION: &str = "ActorStateProviderOverride";
/// Configuration key within [`STATE_PROVIDER_OVERRIDE_SECTION`].
pub const STATE_PROVIDER_OVERRIDE_KEY: &str = "ActorStateProvider";

/// Derives the canonical actor name from an interface type name.
///
/// Strips a leading `I` only when a second character exists and is not
/// lowercase (so `IFoo` -> `Foo`, but `Izzy` and a bare `I` are left alone),
/// then appends `Actor` unless the name already ends with it, case-insensitively.
#[must_use]
pub fn actor_name(interface_name: &str) -> String {
    let mut chars = interface_name.chars();
    let first = chars.next();
    let second = chars.next();
    let strip_leading_i = matches!(first, Some('I')) && matches!(second, Some(c) if !c.is_lowercase());

    let base = if strip_leading_i {
        &interface_name[1..]
    } else {
        interface_name
    };

    if base.to_ascii_lowercase().ends_with("actor") {
        base.to_string()
    } else {
        format!("{base}Actor")
    }
}

/// `<ActorName>Service`.
#[must_use]
pub fn service_name(actor_name: &str) -> String {
    format!("{actor_name}Service")
}

/// `<ServiceName>Type`.
#[must_use]
pub fn service_type_name(service_name: &str) -> String {
    format!("{service_name}Type")
}

/// `<ServiceName>Endpoint`.
#[must_use]
pub fn endpoint_name(service_name: &str) -> String {
    format!("{service_name}Endpoint")
}

/// `<ServiceName>EndpointV2`.
#[must_use]
pub fn endpoint_v2_name(service_name: &str) -> String {
    format!("{service_name}EndpointV2")
}

/// `<ServiceName>EndpointV2_1`, the wrapped-message variant of the V2 endpoint.
#[must_use]
pub fn wrapped_message_endpoint_name(service_name: &str) -> String {
    format!("{service_name}EndpointV2_1")
}

/// `<ServiceName>ReplicatorEndpoint`.
#[must_use]
pub fn replicator_endpoint_name(service_name: &str) -> String {
    format!("{service_name}ReplicatorEndpoint")
}

/// `<ServiceName>ReplicatorConfig`.
#[must_use]
pub fn replicator_config_section_name(service_name: &str) -> String {
    format!("{service_name}ReplicatorConfig")
}

/// `<ServiceName>ReplicatorSecurityConfig`.
#[must_use]
pub fn replicator_security_config_section_name(service_name: &str) -> String {
    format!("{service_name}ReplicatorSecurityConfig")
}

/// `<ServiceName>ActorStateProviderSettings`.
#[must_use]
pub fn state_provider_settings_name(service_name: &str) -> String {
    format!("{service_name}ActorStateProviderSettings")
}

/// `<ServiceName>TransportSettings`.
#[must_use]
pub fn transport_settings_name(service_name: &str) -> String {
    format!("{service_name}TransportSettings")
}

/// `<ServiceName>LocalStoreConfig`.
#[must_use]
pub fn local_store_config_name(service_name: &str) -> String {
    format!("{service_name}LocalStoreConfig")
}

/// Default service-package name: [`DEFAULT_SERVICE_PACKAGE_PREFIX`] + `Pkg`.
#[must_use]
pub fn default_service_package_name() -> String {
    format!("{DEFAULT_SERVICE_PACKAGE_PREFIX}Pkg")
}

/// Normalizes an application name into a `fabric:/`-rooted URI. Preserves an
/// already `fabric:/`-rooted name (case-insensitively) rather than
/// double-prefixing it, and trims a trailing `/` before concatenation.
#[must_use]
pub fn normalize_application_uri(application_name: &str) -> String {
    let trimmed = application_name.trim_end_matches('/');
    if trimmed.len() >= 8 && trimmed[..8].eq_ignore_ascii_case("fabric:/") {
        trimmed.to_string()
    } else {
        format!("fabric:/{trimmed}")
    }
}
