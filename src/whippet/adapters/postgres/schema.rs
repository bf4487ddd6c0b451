//! Diesel schema for Whippet entity persistence.

diesel::table! {
    /// Tenants integrated by Whippet.
    tenants (id) {
        /// Tenant identifier.
        id -> Uuid,
        /// Unique tenant slug.
        #[max_length = 64]
        code -> Varchar,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Activation flag.
        is_active -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// External systems registered per tenant.
    applications (id) {
        /// Application identifier.
        id -> Uuid,
        /// Owning tenant.
        tenant_id -> Uuid,
        /// Application kind (`magento`, `mom`, `salesforce`).
        #[max_length = 32]
        kind -> Varchar,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Optional base URL.
        #[max_length = 512]
        base_url -> Nullable<Varchar>,
        /// Enablement flag.
        is_enabled -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tenant and application scoped settings.
    settings (id) {
        /// Setting identifier.
        id -> Uuid,
        /// Owning tenant.
        tenant_id -> Uuid,
        /// Optional application scope.
        application_id -> Nullable<Uuid>,
        /// Dotted setting key.
        #[max_length = 128]
        key -> Varchar,
        /// Raw setting value.
        value -> Text,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tracked background jobs.
    jobs (id) {
        /// Job identifier.
        id -> Uuid,
        /// Owning tenant.
        tenant_id -> Uuid,
        /// Job kind.
        #[max_length = 50]
        kind -> Varchar,
        /// Lifecycle state.
        #[max_length = 50]
        status -> Varchar,
        /// External reference such as a Magento bulk UUID.
        #[max_length = 255]
        external_ref -> Nullable<Varchar>,
        /// Outcome detail.
        detail -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Completion timestamp.
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(applications -> tenants (tenant_id));
diesel::joinable!(settings -> tenants (tenant_id));
diesel::joinable!(jobs -> tenants (tenant_id));

diesel::allow_tables_to_appear_in_same_query!(applications, jobs, settings, tenants);
