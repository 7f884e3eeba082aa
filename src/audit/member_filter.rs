//! Which members of an audited type are expected to have a documentation page

use crate::api::{MemberCandidate, MemberKind, TypeCandidate};

/// Compiler-generated accessor and operator methods
const SPECIAL_NAME_PREFIXES: [&str; 5] = ["get_", "set_", "op_", "add_", "remove_"];

/// `System.Object` methods that never get their own page
const OBJECT_METHODS: [&str; 3] = ["Equals", "GetHashCode", "ToString"];

/// Whether `member` of `ty` takes part in the audit
pub fn is_candidate_member(member: &MemberCandidate, ty: &TypeCandidate) -> bool {
    if member.declaring_type != ty.full_name {
        return false;
    }

    if matches!(member.kind, MemberKind::Constructor | MemberKind::NestedType) {
        return false;
    }

    if SPECIAL_NAME_PREFIXES.iter().any(|prefix| member.name.starts_with(prefix))
        || OBJECT_METHODS.contains(&member.name.as_str())
    {
        return false;
    }

    if member.obsolete.is_present() {
        return false;
    }

    // overrides are documented on the base member
    !(member.is_override && matches!(member.kind, MemberKind::Method | MemberKind::Property))
}
