//! Visibility classification and its enforcement.
//!
//! Classes and members carry a visibility annotation in their definition.
//! The annotations are resolved once, while a session builds its schemas, into
//! a class admission decision and the per-member gates.

use serde::{Deserialize, Serialize};

use crate::SerializerOptions;

/// Class-level annotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    /// No annotation.
    #[default]
    Unmarked,
    /// All members are public unless marked otherwise.
    Public,
    /// Only members explicitly marked public are public.
    Protected,
    /// Never exposed in public-only sessions.
    Private,
    /// Never serialized.
    Unserialized,
}

/// Member-level override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberVisibility {
    #[default]
    Unmarked,
    Public,
    Private,
    Unserialized,
}

/// Outcome of checking a class against a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassAdmission {
    Admitted,
    /// The class has no repo in this session; its instances serialize as null.
    Hidden,
    /// The class cannot be serialized at all and degrades to unknown.
    Rejected(&'static str),
}

/// Decides whether a class gets a repo in a session with `options`.
pub fn admit_class(visibility: Visibility, options: &SerializerOptions) -> ClassAdmission {
    match visibility {
        Visibility::Unserialized => ClassAdmission::Rejected("class is marked unserialized"),
        Visibility::Private if options.public_only => ClassAdmission::Hidden,
        Visibility::Unmarked if options.public_only => {
            ClassAdmission::Rejected("class has no visibility annotation in a public-only session")
        }
        _ => ClassAdmission::Admitted,
    }
}

/// Whether a member of an admitted class takes part in a session with `options`.
pub fn admit_member(
    class: Visibility,
    member: MemberVisibility,
    options: &SerializerOptions,
) -> bool {
    if member == MemberVisibility::Unserialized {
        return false;
    }
    if !options.public_only {
        return true;
    }
    match class {
        Visibility::Protected => member == MemberVisibility::Public,
        Visibility::Public => member != MemberVisibility::Private,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{ClassAdmission, MemberVisibility, Visibility, admit_class, admit_member};
    use crate::SerializerOptions;

    #[test]
    fn class_admission() {
        let open = SerializerOptions::new();
        let public = SerializerOptions::new().public_only(true);

        assert_eq!(admit_class(Visibility::Unmarked, &open), ClassAdmission::Admitted);
        assert_eq!(admit_class(Visibility::Private, &open), ClassAdmission::Admitted);
        assert_eq!(admit_class(Visibility::Private, &public), ClassAdmission::Hidden);
        assert!(matches!(
            admit_class(Visibility::Unmarked, &public),
            ClassAdmission::Rejected(_)
        ));
        assert!(matches!(
            admit_class(Visibility::Unserialized, &open),
            ClassAdmission::Rejected(_)
        ));
    }

    #[test]
    fn member_admission() {
        let open = SerializerOptions::new();
        let public = SerializerOptions::new().public_only(true);

        assert!(admit_member(Visibility::Unmarked, MemberVisibility::Private, &open));
        assert!(!admit_member(Visibility::Public, MemberVisibility::Unserialized, &open));

        assert!(admit_member(Visibility::Public, MemberVisibility::Unmarked, &public));
        assert!(!admit_member(Visibility::Public, MemberVisibility::Private, &public));
        assert!(!admit_member(Visibility::Protected, MemberVisibility::Unmarked, &public));
        assert!(admit_member(Visibility::Protected, MemberVisibility::Public, &public));
    }
}
