use std::sync::{Arc, Barrier};
use std::thread;

use super::common::*;
use crate::workflows::adoption::domain::ApplicationStatus;
use crate::workflows::adoption::AdoptionError;
use crate::workflows::catalog::domain::PetStatus;

#[test]
fn racing_approvals_produce_a_single_winner() {
    for _ in 0..25 {
        let fixture = fixture();
        let first = fixture.adopter("dana");
        let second = fixture.adopter("riley");
        let ids = fixture.seed_pending(&[&first, &second]);
        let staff = fixture.staff();
        let barrier = Arc::new(Barrier::new(ids.len()));

        let handles: Vec<_> = ids
            .iter()
            .map(|id| {
                let workflow = fixture.workflow.clone();
                let barrier = barrier.clone();
                let id = *id;
                thread::spawn(move || {
                    barrier.wait();
                    workflow.approve(&staff, id)
                })
            })
            .collect();

        let outcomes: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("approval thread panicked"))
            .collect();

        let winners = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
        let losers = outcomes
            .iter()
            .filter(|outcome| {
                matches!(
                    outcome,
                    Err(AdoptionError::InvalidTransition {
                        from: ApplicationStatus::Rejected,
                        ..
                    })
                )
            })
            .count();
        assert_eq!(winners, 1);
        assert_eq!(losers, 1);

        let statuses: Vec<_> = ids.iter().map(|id| fixture.stored(*id).status).collect();
        assert_eq!(
            statuses
                .iter()
                .filter(|status| **status == ApplicationStatus::Approved)
                .count(),
            1
        );
        assert_eq!(fixture.pet_status(), PetStatus::Adopted);
    }
}

#[test]
fn concurrent_submissions_admit_one_applicant() {
    let fixture = fixture();
    let applicants: Vec<_> = ["dana", "riley", "sam", "lee"]
        .iter()
        .map(|name| fixture.adopter(name))
        .collect();
    let barrier = Arc::new(Barrier::new(applicants.len()));

    let handles: Vec<_> = applicants
        .into_iter()
        .map(|caller| {
            let workflow = fixture.workflow.clone();
            let barrier = barrier.clone();
            let pet = fixture.pet;
            thread::spawn(move || {
                barrier.wait();
                workflow.submit(&caller, submission(pet))
            })
        })
        .collect();

    let accepted = handles
        .into_iter()
        .map(|handle| handle.join().expect("submission thread panicked"))
        .filter(Result::is_ok)
        .count();

    assert_eq!(accepted, 1);
    assert_eq!(fixture.pet_status(), PetStatus::Pending);
}
