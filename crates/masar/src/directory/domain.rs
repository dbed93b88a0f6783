use serde::{Deserialize, Serialize};

/// Identifier wrapper for registered teachers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeacherId(pub String);

/// Identifier wrapper for registered schools.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchoolId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecialtyId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdminId(pub String);

macro_rules! id_display {
    ($($ty:ty),+) => {
        $(impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        })+
    };
}

id_display!(TeacherId, SchoolId, SpecialtyId, VideoId, AdminId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Parses the stored lowercase form; anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightTicket {
    Full,
    Half,
    None,
}

/// Registered teacher. Phone number and national ID are globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: TeacherId,
    pub full_name: String,
    pub phone_number: String,
    #[serde(rename = "nationalID")]
    pub national_id: String,
    pub gender: Gender,
    pub age: u8,
    pub address: String,
    pub academic_qualification: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diploma: Option<String>,
    #[serde(default)]
    pub courses: Vec<String>,
    #[serde(default)]
    pub specialties: Vec<SpecialtyId>,
    #[serde(default)]
    pub taught_stages: Vec<String>,
    #[serde(default)]
    pub worked_in_oman_before: bool,
    #[serde(default)]
    pub videos: Vec<VideoId>,
}

impl Teacher {
    pub fn has_specialty(&self, specialty: &SpecialtyId) -> bool {
        self.specialties.contains(specialty)
    }

    pub fn party(&self) -> PartyRef<TeacherId> {
        PartyRef {
            id: self.id.clone(),
            name: self.full_name.clone(),
        }
    }

    pub fn summary(&self) -> TeacherSummary {
        TeacherSummary {
            id: self.id.clone(),
            full_name: self.full_name.clone(),
            phone_number: self.phone_number.clone(),
            gender: self.gender,
            age: self.age,
            academic_qualification: self.academic_qualification.clone(),
            specialties: self.specialties.clone(),
            taught_stages: self.taught_stages.clone(),
            worked_in_oman_before: self.worked_in_oman_before,
            videos: self.videos.clone(),
        }
    }
}

/// Registered school. The WhatsApp phone is globally unique.
///
/// `selected_teachers` is the shortlist: a membership set that never holds the
/// same teacher twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: SchoolId,
    pub manager_name: String,
    pub whatsapp_phone: String,
    pub school_name: String,
    pub school_location: String,
    #[serde(default)]
    pub stages_needed: Vec<String>,
    #[serde(default)]
    pub specialties_needed: Vec<SpecialtyId>,
    pub expected_salary_range: String,
    pub flight_ticket_provided: FlightTicket,
    #[serde(default)]
    pub housing_provided: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub housing_allowance: Option<String>,
    #[serde(default)]
    pub selected_teachers: Vec<TeacherId>,
}

impl School {
    pub fn has_selected(&self, teacher: &TeacherId) -> bool {
        self.selected_teachers.contains(teacher)
    }

    pub fn summary(&self) -> SchoolSummary {
        SchoolSummary {
            id: self.id.clone(),
            school_name: self.school_name.clone(),
            manager_name: self.manager_name.clone(),
            school_location: self.school_location.clone(),
            whatsapp_phone: self.whatsapp_phone.clone(),
        }
    }

    pub fn party(&self) -> PartyRef<SchoolId> {
        PartyRef {
            id: self.id.clone(),
            name: self.school_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAccount {
    pub id: AdminId,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specialty {
    pub id: SpecialtyId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_ar: Option<String>,
}

impl Specialty {
    pub fn display_name(&self) -> &str {
        self.name_ar.as_deref().unwrap_or(&self.name)
    }
}

/// Public projection of a teacher record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSummary {
    pub id: TeacherId,
    pub full_name: String,
    pub phone_number: String,
    pub gender: Gender,
    pub age: u8,
    pub academic_qualification: String,
    pub specialties: Vec<SpecialtyId>,
    pub taught_stages: Vec<String>,
    pub worked_in_oman_before: bool,
    pub videos: Vec<VideoId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolSummary {
    pub id: SchoolId,
    pub school_name: String,
    pub manager_name: String,
    pub school_location: String,
    pub whatsapp_phone: String,
}

/// `{id, name}` pair used in selection responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyRef<I> {
    pub id: I,
    pub name: String,
}
