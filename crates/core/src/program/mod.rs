//! Program descriptors for the supported discount offers.
//!
//! Every offer shares the same remote workflow shape but differs in step
//! names, required documents, and identity constraints. Programs are a closed
//! set of tagged configurations; the protocol client is parameterized by a
//! descriptor rather than subclassed per offer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::document::DocumentKind;

/// A supported discount/eligibility offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Program {
    K12Teacher,
    StudentMusic,
    StudentVideo,
    StudentAi,
    TeacherDev,
}

fn org(id: i64, name: &str, domain: Option<&str>) -> Organization {
    Organization {
        id,
        id_extended: id.to_string(),
        name: name.to_string(),
        domain: domain.map(str::to_string),
    }
}

impl Program {
    /// All known programs, in a stable order.
    pub const ALL: [Program; 5] = [
        Program::K12Teacher,
        Program::StudentMusic,
        Program::StudentVideo,
        Program::StudentAi,
        Program::TeacherDev,
    ];

    /// Stable identifier used for admission buckets and config keys.
    pub fn key(&self) -> &'static str {
        match self {
            Program::K12Teacher => "k12_teacher",
            Program::StudentMusic => "student_music",
            Program::StudentVideo => "student_video",
            Program::StudentAi => "student_ai",
            Program::TeacherDev => "teacher_dev",
        }
    }

    /// Look up a program by its key.
    pub fn from_key(key: &str) -> Option<Program> {
        Program::ALL.iter().copied().find(|p| p.key() == key)
    }

    /// The workflow descriptor for this program.
    pub fn descriptor(&self) -> ProgramDescriptor {
        match self {
            Program::K12Teacher => ProgramDescriptor {
                program: *self,
                collect_step: "collectTeacherPersonalInfo",
                document_kinds: &[DocumentKind::EmploymentRecord, DocumentKind::IdentityCard],
                identity: IdentityConstraints {
                    birth_year_min: 1970,
                    birth_year_max: 1990,
                    email: EmailStyle::ConsumerMailbox,
                },
                organizations: vec![
                    org(528096, "Jefferson County Public Schools", None),
                    org(554626, "Los Angeles Unified School District", None),
                    org(531887, "Chicago Public Schools", None),
                    org(529218, "Fairfax County Public Schools", None),
                ],
            },
            Program::StudentMusic => ProgramDescriptor {
                program: *self,
                collect_step: "collectStudentPersonalInfo",
                document_kinds: &[DocumentKind::IdentityCard],
                identity: IdentityConstraints {
                    birth_year_min: 2000,
                    birth_year_max: 2005,
                    email: EmailStyle::CampusToken,
                },
                organizations: vec![
                    org(2570, "Pennsylvania State University", Some("psu.edu")),
                    org(3601, "The Ohio State University", Some("osu.edu")),
                    org(2746, "University of Michigan", Some("umich.edu")),
                ],
            },
            Program::StudentVideo => ProgramDescriptor {
                program: *self,
                collect_step: "collectStudentPersonalInfo",
                document_kinds: &[DocumentKind::IdentityCard],
                identity: IdentityConstraints {
                    birth_year_min: 2000,
                    birth_year_max: 2006,
                    email: EmailStyle::CampusToken,
                },
                organizations: vec![
                    org(3499, "Massachusetts Institute of Technology", Some("mit.edu")),
                    org(3382, "Stanford University", Some("stanford.edu")),
                    org(1426, "University of California, Berkeley", Some("berkeley.edu")),
                ],
            },
            Program::StudentAi => ProgramDescriptor {
                program: *self,
                collect_step: "collectStudentPersonalInfo",
                document_kinds: &[DocumentKind::TuitionInvoice],
                identity: IdentityConstraints {
                    birth_year_min: 2000,
                    birth_year_max: 2006,
                    email: EmailStyle::OrganizationMailbox,
                },
                organizations: vec![
                    org(291085, "University of Groningen", Some("rug.nl")),
                    org(290962, "Delft University of Technology", Some("tudelft.nl")),
                    org(291047, "Utrecht University", Some("uu.nl")),
                ],
            },
            Program::TeacherDev => ProgramDescriptor {
                program: *self,
                collect_step: "collectTeacherPersonalInfo",
                document_kinds: &[DocumentKind::EmploymentRecord],
                identity: IdentityConstraints {
                    birth_year_min: 1968,
                    birth_year_max: 1988,
                    email: EmailStyle::ConsumerMailbox,
                },
                organizations: vec![
                    org(605112, "Austin Independent School District", None),
                    org(604882, "Houston Independent School District", None),
                    org(605301, "Denver Public Schools", None),
                ],
            },
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Everything the workflow needs to know about one program.
#[derive(Debug, Clone)]
pub struct ProgramDescriptor {
    pub program: Program,
    /// Remote step name for the personal-info submission.
    pub collect_step: &'static str,
    /// Required proof documents, in upload order.
    pub document_kinds: &'static [DocumentKind],
    pub identity: IdentityConstraints,
    /// Organizations accepted for this program. Never empty; the first entry
    /// is the default.
    pub organizations: Vec<Organization>,
}

impl ProgramDescriptor {
    /// Fallback organization when the caller expresses no preference.
    pub fn default_organization(&self) -> &Organization {
        &self.organizations[0]
    }

    /// Look up an organization from this program's directory by id.
    pub fn organization(&self, id: i64) -> Option<&Organization> {
        self.organizations.iter().find(|o| o.id == id)
    }

    /// Consent metadata sent with the collect-info step.
    pub fn consent_text(&self) -> &'static str {
        "By submitting the personal information above, I acknowledge that my \
         personal information is being collected under the privacy policy of \
         the business from which I am seeking a discount"
    }
}

/// Constraints the identity synthesizer must satisfy for a program.
#[derive(Debug, Clone, Copy)]
pub struct IdentityConstraints {
    pub birth_year_min: i32,
    pub birth_year_max: i32,
    pub email: EmailStyle,
}

/// How the email address is derived for a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailStyle {
    /// Name-derived local part at a consumer mail provider.
    ConsumerMailbox,
    /// Name-derived local part at the organization's domain.
    OrganizationMailbox,
    /// Random uppercase alphanumeric token at the organization's domain.
    CampusToken,
}

/// An organization as reported to the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub id_extended: String,
    pub name: String,
    pub domain: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip() {
        for program in Program::ALL {
            assert_eq!(Program::from_key(program.key()), Some(program));
        }
        assert_eq!(Program::from_key("unknown_offer"), None);
    }

    #[test]
    fn test_descriptor_document_order() {
        let descriptor = Program::K12Teacher.descriptor();
        assert_eq!(
            descriptor.document_kinds,
            &[DocumentKind::EmploymentRecord, DocumentKind::IdentityCard]
        );
    }

    #[test]
    fn test_birth_year_ranges_are_ordered() {
        for program in Program::ALL {
            let c = program.descriptor().identity;
            assert!(c.birth_year_min <= c.birth_year_max, "{}", program);
        }
    }

    #[test]
    fn test_every_program_has_an_organization_directory() {
        for program in Program::ALL {
            let descriptor = program.descriptor();
            assert!(
                descriptor.organizations.len() >= 2,
                "{} needs a directory, not a single organization",
                program
            );
            assert_eq!(
                descriptor.default_organization().id,
                descriptor.organizations[0].id
            );
        }
    }

    #[test]
    fn test_organization_lookup_by_id() {
        let descriptor = Program::StudentMusic.descriptor();
        let default_id = descriptor.default_organization().id;
        assert_eq!(descriptor.organization(default_id).map(|o| o.id), Some(default_id));
        assert!(descriptor.organization(-1).is_none());
    }

    #[test]
    fn test_campus_styles_have_domain() {
        for program in Program::ALL {
            let descriptor = program.descriptor();
            if matches!(
                descriptor.identity.email,
                EmailStyle::CampusToken | EmailStyle::OrganizationMailbox
            ) {
                for organization in &descriptor.organizations {
                    assert!(
                        organization.domain.is_some(),
                        "{} organization {} needs a domain",
                        program,
                        organization.name
                    );
                }
            }
        }
    }
}
