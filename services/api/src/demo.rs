use crate::infra::{in_memory_marketplace, seed_demo_data, DemoSeed};
use clap::Args;
use pet_adoption::access::{Caller, User};
use pet_adoption::config::{CacheConfig, PagingConfig};
use pet_adoption::error::AppError;
use pet_adoption::workflows::adoption::{ApplicantContact, ApplicationSubmission, Decision};
use pet_adoption::workflows::catalog::{PetId, PetQuery, PetView};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Run the walk-through with the read-through cache switched off.
    #[arg(long)]
    pub(crate) no_cache: bool,
    /// Print each approve/reject decision as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { no_cache, json } = args;

    let marketplace = in_memory_marketplace(
        &CacheConfig {
            enabled: !no_cache,
        },
        PagingConfig::default(),
    );
    let DemoSeed {
        admin,
        staff,
        adopters,
        shelter,
        pets,
    } = seed_demo_data(&marketplace)?;

    println!("Pet adoption demo");
    println!(
        "- Shelter {} ({}) staffed by {}, administered by {}",
        shelter.name, shelter.id, staff.username, admin.username
    );
    print_listing("Listed pets", &pets);

    let (Some(first), Some(second), Some(dana), Some(riley)) =
        (pets.first(), pets.get(1), adopters.first(), adopters.get(1))
    else {
        println!("  Demo seed is missing pets or adopters");
        return Ok(());
    };
    let staff = Caller::for_user(&staff);
    let workflow = &marketplace.applications;

    println!("\nApplications");
    let winning = workflow.submit(&Caller::for_user(dana), submission(dana, first.id))?;
    println!(
        "- {} applied for {} -> {} is now {}",
        dana.username,
        first.name,
        winning.id,
        winning.status.label()
    );
    match workflow.submit(&Caller::for_user(riley), submission(riley, first.id)) {
        Ok(application) => println!("  Unexpectedly accepted {}", application.id),
        Err(err) => println!("- {} turned away: {}", riley.username, err),
    }
    let fallback = workflow.submit(&Caller::for_user(riley), submission(riley, second.id))?;
    println!(
        "- {} applied for {} instead -> {}",
        riley.username, second.name, fallback.id
    );
    print_listing("Catalog after intake", &marketplace.pets.list(&PetQuery::default())?.items);

    println!("\nDecisions by {}", shelter.name);
    let approved = workflow.approve(&staff, winning.id)?;
    print_decision("Approved", &approved, json);
    let rejected = workflow.reject(&staff, fallback.id)?;
    print_decision("Rejected", &rejected, json);
    if let Err(err) = workflow.reject(&staff, winning.id) {
        println!("- Second decision on {} refused: {}", winning.id, err);
    }

    let listing = marketplace.pets.list(&PetQuery::default())?;
    print_listing("Catalog after decisions", &listing.items);
    marketplace.pets.list(&PetQuery::default())?;
    let stats = marketplace.cache.stats();
    println!(
        "\nCache {}: {} hits / {} misses / {} entries",
        if marketplace.cache.is_enabled() {
            "enabled"
        } else {
            "disabled"
        },
        stats.hits,
        stats.misses,
        stats.entries
    );

    Ok(())
}

fn submission(user: &User, pet_id: PetId) -> ApplicationSubmission {
    ApplicationSubmission {
        pet_id,
        applicant_id: None,
        contact: ApplicantContact {
            name: user.username.clone(),
            email: user.email.clone(),
            phone: "555-0142".to_string(),
            address: "18 Willow Ln".to_string(),
        },
        notes: Some("Fenced yard".to_string()),
    }
}

fn print_listing(title: &str, pets: &[PetView]) {
    println!("\n{title}");
    for pet in pets {
        println!(
            "  - {} {} ({}, {}) -> {}",
            pet.id,
            pet.name,
            pet.kind.label(),
            pet.breed,
            pet.status.label()
        );
    }
}

fn print_decision(verb: &str, decision: &Decision, json: bool) {
    println!(
        "- {verb} {} for {}: pet {} -> {}",
        decision.application.id,
        decision.application.pet_name,
        decision.pet.previous.label(),
        decision.pet.current.label()
    );
    if !decision.rejected.is_empty() {
        let closed: Vec<String> = decision.rejected.iter().map(ToString::to_string).collect();
        println!("  Closed competing applications: {}", closed.join(", "));
    }
    if json {
        match serde_json::to_string_pretty(decision) {
            Ok(payload) => println!("{payload}"),
            Err(err) => println!("  Decision payload unavailable: {err}"),
        }
    }
}
