//! Application services for Whippet entity provisioning.

mod provisioning;

pub use provisioning::{
    ProvisioningError, ProvisioningResult, RegisterApplicationRequest, RegisterTenantRequest,
    SetSettingRequest, TenantProvisioningService,
};
