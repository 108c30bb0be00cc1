use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::PagingConfig;

const MAX_NAME_LEN: usize = 100;
const MAX_BREED_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;
const MAX_ADDRESS_LEN: usize = 200;
const MAX_PHONE_LEN: usize = 20;
const MAX_AGE: u8 = 30;

/// Identifier wrapper for listed pets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PetId(pub u64);

impl fmt::Display for PetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pet-{}", self.0)
    }
}

/// Identifier wrapper for shelters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShelterId(pub u64);

impl fmt::Display for ShelterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shelter-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PetKind {
    Dog,
    Cat,
    Bird,
    Rabbit,
    Other,
}

impl PetKind {
    pub const fn label(self) -> &'static str {
        match self {
            PetKind::Dog => "dog",
            PetKind::Cat => "cat",
            PetKind::Bird => "bird",
            PetKind::Rabbit => "rabbit",
            PetKind::Other => "other",
        }
    }
}

/// Availability of a pet. Owned by the availability reconciler once applications exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PetStatus {
    Available,
    Pending,
    Adopted,
}

impl PetStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PetStatus::Available => "available",
            PetStatus::Pending => "pending",
            PetStatus::Adopted => "adopted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: PetId,
    pub name: String,
    pub kind: PetKind,
    pub breed: String,
    pub age: u8,
    pub description: Option<String>,
    pub status: PetStatus,
    pub shelter_id: Option<ShelterId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelter {
    pub id: ShelterId,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Payload for listing a new pet. New pets always start out available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetDraft {
    pub name: String,
    pub kind: PetKind,
    pub breed: String,
    #[serde(default)]
    pub age: u8,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub shelter_id: Option<ShelterId>,
}

impl PetDraft {
    pub fn validate(&self) -> Result<(), String> {
        require_text("name", &self.name, MAX_NAME_LEN)?;
        require_text("breed", &self.breed, MAX_BREED_LEN)?;
        check_age(self.age)?;
        optional_text("description", self.description.as_deref(), MAX_DESCRIPTION_LEN)
    }
}

/// Partial pet update. Omitted fields keep their stored values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: Option<PetKind>,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub shelter_id: Option<ShelterId>,
}

impl PetChanges {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            require_text("name", name, MAX_NAME_LEN)?;
        }
        if let Some(breed) = &self.breed {
            require_text("breed", breed, MAX_BREED_LEN)?;
        }
        if let Some(age) = self.age {
            check_age(age)?;
        }
        optional_text("description", self.description.as_deref(), MAX_DESCRIPTION_LEN)
    }

    pub fn apply_to(self, pet: &mut Pet) {
        if let Some(name) = self.name {
            pet.name = name;
        }
        if let Some(kind) = self.kind {
            pet.kind = kind;
        }
        if let Some(breed) = self.breed {
            pet.breed = breed;
        }
        if let Some(age) = self.age {
            pet.age = age;
        }
        if let Some(description) = self.description {
            pet.description = Some(description);
        }
        if let Some(shelter_id) = self.shelter_id {
            pet.shelter_id = Some(shelter_id);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelterDraft {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ShelterDraft {
    pub fn validate(&self) -> Result<(), String> {
        require_text("name", &self.name, MAX_NAME_LEN)?;
        require_text("address", &self.address, MAX_ADDRESS_LEN)?;
        optional_text("phone", self.phone.as_deref(), MAX_PHONE_LEN)?;
        check_email(self.email.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelterChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ShelterChanges {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            require_text("name", name, MAX_NAME_LEN)?;
        }
        if let Some(address) = &self.address {
            require_text("address", address, MAX_ADDRESS_LEN)?;
        }
        optional_text("phone", self.phone.as_deref(), MAX_PHONE_LEN)?;
        check_email(self.email.as_deref())
    }

    pub fn apply_to(self, shelter: &mut Shelter) {
        if let Some(name) = self.name {
            shelter.name = name;
        }
        if let Some(address) = self.address {
            shelter.address = address;
        }
        if let Some(phone) = self.phone {
            shelter.phone = Some(phone);
        }
        if let Some(email) = self.email {
            shelter.email = Some(email);
        }
    }
}

/// Filters and paging accepted by the pet listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetQuery {
    #[serde(default)]
    pub kind: Option<PetKind>,
    #[serde(default)]
    pub status: Option<PetStatus>,
    #[serde(default)]
    pub shelter_id: Option<u64>,
    #[serde(default)]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl PetQuery {
    pub fn matches(&self, pet: &Pet) -> bool {
        self.kind.map_or(true, |kind| pet.kind == kind)
            && self.status.map_or(true, |status| pet.status == status)
            && self
                .shelter_id
                .map_or(true, |shelter| pet.shelter_id == Some(ShelterId(shelter)))
    }

    pub fn page(&self, paging: &PagingConfig) -> PageRequest {
        let size = self
            .page_size
            .filter(|size| *size > 0)
            .unwrap_or(paging.default_page_size)
            .min(paging.max_page_size);
        PageRequest {
            number: self.page_number.filter(|number| *number > 0).unwrap_or(1),
            size,
        }
    }

    /// Stable cache signature covering every filter and the resolved page.
    pub fn signature(&self, page: PageRequest) -> String {
        format!(
            "kind={}&status={}&shelter={}&page={}&size={}",
            self.kind.map_or("*", PetKind::label),
            self.status.map_or("*", PetStatus::label),
            self.shelter_id
                .map_or_else(|| "*".to_string(), |id| id.to_string()),
            page.number,
            page.size
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u32,
    pub size: u32,
}

/// Paginated listing envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn slice(all: Vec<T>, request: PageRequest) -> Self {
        let total_count = all.len() as u64;
        let size = u64::from(request.size.max(1));
        let total_pages = total_count.div_ceil(size);
        let skip = u64::from(request.number.saturating_sub(1)).saturating_mul(size);
        let items = all
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(request.size as usize)
            .collect();

        Self {
            items,
            page_number: request.number,
            page_size: request.size,
            total_count,
            total_pages,
        }
    }
}

/// Public pet representation, enriched with the owning shelter's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetView {
    pub id: PetId,
    pub name: String,
    pub kind: PetKind,
    pub breed: String,
    pub age: u8,
    pub description: Option<String>,
    pub status: PetStatus,
    pub created_at: DateTime<Utc>,
    pub shelter_id: Option<ShelterId>,
    pub shelter_name: Option<String>,
}

impl PetView {
    pub fn new(pet: Pet, shelter: Option<&Shelter>) -> Self {
        Self {
            id: pet.id,
            name: pet.name,
            kind: pet.kind,
            breed: pet.breed,
            age: pet.age,
            description: pet.description,
            status: pet.status,
            created_at: pet.created_at,
            shelter_id: pet.shelter_id,
            shelter_name: shelter.map(|shelter| shelter.name.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelterView {
    pub id: ShelterId,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub pet_count: u64,
}

impl ShelterView {
    pub fn new(shelter: Shelter, pet_count: u64) -> Self {
        Self {
            id: shelter.id,
            name: shelter.name,
            address: shelter.address,
            phone: shelter.phone,
            email: shelter.email,
            pet_count,
        }
    }
}

pub(crate) fn require_text(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    if value.chars().count() > max {
        return Err(format!("{field} must be at most {max} characters"));
    }
    Ok(())
}

pub(crate) fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<(), String> {
    match value {
        Some(value) if value.chars().count() > max => {
            Err(format!("{field} must be at most {max} characters"))
        }
        _ => Ok(()),
    }
}

pub(crate) fn check_email(value: Option<&str>) -> Result<(), String> {
    match value {
        Some(email) if !looks_like_email(email) => Err(format!("'{email}' is not an email address")),
        Some(email) => optional_text("email", Some(email), MAX_NAME_LEN),
        None => Ok(()),
    }
}

pub(crate) fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}

fn check_age(age: u8) -> Result<(), String> {
    if age > MAX_AGE {
        return Err(format!("age must be between 0 and {MAX_AGE}"));
    }
    Ok(())
}
