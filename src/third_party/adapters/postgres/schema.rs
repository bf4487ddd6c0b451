//! Diesel schema for third-party entity maps.

diesel::table! {
    /// Pairings between internal records and third-party identifiers.
    third_party_entity_maps (tenant_id, system, entity_type, internal_key) {
        /// Owning tenant.
        tenant_id -> Uuid,
        /// External system.
        #[max_length = 32]
        system -> Varchar,
        /// Entity type label.
        #[max_length = 64]
        entity_type -> Varchar,
        /// Internal record key.
        #[max_length = 255]
        internal_key -> Varchar,
        /// Third-party identifier.
        #[max_length = 255]
        external_id -> Varchar,
        /// Source of truth.
        #[max_length = 16]
        authority -> Varchar,
        /// SHA-256 hex of the last synchronized payload.
        #[max_length = 64]
        fingerprint -> Varchar,
        /// Time of the last synchronization.
        synced_at -> Timestamptz,
    }
}
