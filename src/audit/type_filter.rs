//! Which exported types are expected to have a documentation page

use crate::api::{TypeCandidate, Visibility};
use crate::config::ObsoletePolicy;

/// Whether `ty` takes part in the audit
///
/// Non-public and nested types, interfaces, abstract and static classes, generic
/// types and delegates are never audited. Obsolete types are dropped according to
/// `policy`.
pub fn is_candidate_type(ty: &TypeCandidate, policy: ObsoletePolicy) -> bool {
    if ty.visibility != Visibility::Public
        || ty.is_interface
        || ty.is_abstract
        || ty.is_generic
        || ty.is_delegate
    {
        return false;
    }

    match policy {
        ObsoletePolicy::AnyMarker => !ty.obsolete.is_present(),
        ObsoletePolicy::ErrorOnly => !ty.obsolete.is_error(),
    }
}
