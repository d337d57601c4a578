//! Scenario: requisition lifecycle through the service
//!
//! # Coverage
//! 1. initiate pre-populates one empty line per catalog product.
//! 2. A second non-emergency initiate for the same triple is a Conflict; an
//!    emergency one is allowed.
//! 3. initiate with an unknown facility is NotFound.
//! 4. delete succeeds only from INITIATED; otherwise `false` and unchanged.
//! 5. authorize succeeds only from SUBMITTED; otherwise an error and unchanged.
//! 6. skip on a non-skippable program is `false`, never an error.
//! 7. approve of SUBMITTED succeeds only when authorization is skipped.
//! 8. reject sends AUTHORIZED back to INITIATED.
//! 9. release has no status guard and is applied in order.

use rqs_schemas::{Requisition, RequisitionStatus};
use rqs_service::{NewRequisition, RequisitionError};
use rqs_testkit::{complete_line, World};
use uuid::Uuid;

fn new_for(world: &World, emergency: bool) -> NewRequisition {
    NewRequisition {
        facility: world.facility1.id,
        program: world.program1.id,
        processing_period: world.period.id,
        emergency,
        supervisory_node: Some(world.node.id),
    }
}

fn in_status(world: &World, status: RequisitionStatus) -> Requisition {
    let mut r = Requisition::initiated(
        world.facility1.id,
        world.program1.id,
        world.period.id,
        false,
    );
    r.status = status;
    r.requisition_lines = vec![complete_line(world.products[0].id)];
    r
}

#[tokio::test]
async fn initiate_populates_lines_and_guards_duplicates() {
    let world = World::new();
    let h = world.harness();

    let creator = world.clerk.id;
    let r = h
        .service
        .initiate(new_for(&world, false), Some(creator))
        .await
        .unwrap();
    assert_eq!(r.status, RequisitionStatus::Initiated);
    assert_eq!(r.creator, Some(creator));
    assert_eq!(r.requisition_lines.len(), world.products.len());
    assert!(r
        .requisition_lines
        .iter()
        .all(|l| l.requested_quantity.is_none()));

    let dup = h.service.initiate(new_for(&world, false), None).await;
    assert!(matches!(dup, Err(RequisitionError::Conflict(_))), "{dup:?}");

    let emergency = h.service.initiate(new_for(&world, true), None).await.unwrap();
    assert!(emergency.emergency);
    assert_ne!(emergency.id, r.id);
}

#[tokio::test]
async fn initiate_with_unknown_facility_is_not_found() {
    let world = World::new();
    let h = world.harness();

    let mut new = new_for(&world, false);
    new.facility = Uuid::new_v4();
    let err = h.service.initiate(new, None).await.unwrap_err();
    assert!(matches!(err, RequisitionError::NotFound(_)), "{err:?}");
}

#[tokio::test]
async fn delete_only_from_initiated() {
    let world = World::new();
    let h = world.harness();

    for status in RequisitionStatus::ALL {
        let r = in_status(&world, status);
        h.seed(&r).await.unwrap();

        let deleted = h.service.delete(r.id).await.unwrap();
        let after = h.service.get(r.id).await;
        if status == RequisitionStatus::Initiated {
            assert!(deleted);
            assert!(matches!(after, Err(RequisitionError::NotFound(_))));
        } else {
            assert!(!deleted, "{status} must not delete");
            assert_eq!(after.unwrap().status, status);
        }
    }

    let missing = h.service.delete(Uuid::new_v4()).await;
    assert!(matches!(missing, Err(RequisitionError::NotFound(_))));
}

#[tokio::test]
async fn authorize_only_from_submitted() {
    let world = World::new();
    let h = world.harness();

    for status in RequisitionStatus::ALL {
        let r = in_status(&world, status);
        h.seed(&r).await.unwrap();

        let res = h.service.authorize(r.id).await;
        let after = h.service.get(r.id).await.unwrap().status;
        if status == RequisitionStatus::Submitted {
            assert_eq!(res.unwrap().status, RequisitionStatus::Authorized);
            assert_eq!(after, RequisitionStatus::Authorized);
        } else {
            assert!(
                matches!(res, Err(RequisitionError::InvalidTransition(_))),
                "{status}: {res:?}"
            );
            assert_eq!(after, status);
        }
    }
}

#[tokio::test]
async fn skip_is_a_soft_fail() {
    let world = World::new();
    let h = world.harness();

    let mut locked = in_status(&world, RequisitionStatus::Initiated);
    locked.program = world.program2.id;
    h.seed(&locked).await.unwrap();
    assert!(!h.service.skip(locked.id).await.unwrap());
    assert_eq!(
        h.service.get(locked.id).await.unwrap().status,
        RequisitionStatus::Initiated
    );

    let submitted = in_status(&world, RequisitionStatus::Submitted);
    h.seed(&submitted).await.unwrap();
    assert!(!h.service.skip(submitted.id).await.unwrap());

    assert!(!h.service.skip(Uuid::new_v4()).await.unwrap());

    let skippable = in_status(&world, RequisitionStatus::Initiated);
    h.seed(&skippable).await.unwrap();
    assert!(h.service.skip(skippable.id).await.unwrap());
    assert_eq!(
        h.service.get(skippable.id).await.unwrap().status,
        RequisitionStatus::Skipped
    );
}

#[tokio::test]
async fn approve_submitted_depends_on_skip_authorization() {
    let world = World::new();

    let strict = world.harness();
    let r = in_status(&world, RequisitionStatus::Submitted);
    strict.seed(&r).await.unwrap();
    let err = strict.service.approve(r.id).await.unwrap_err();
    assert!(matches!(err, RequisitionError::BadRequest(_)), "{err:?}");
    assert_eq!(
        strict.service.get(r.id).await.unwrap().status,
        RequisitionStatus::Submitted
    );

    let lenient = world.harness_skipping_authorization();
    lenient.seed(&r).await.unwrap();
    assert_eq!(
        lenient.service.approve(r.id).await.unwrap().status,
        RequisitionStatus::Approved
    );

    let missing = strict.service.approve(Uuid::new_v4()).await;
    assert!(matches!(missing, Err(RequisitionError::NotFound(_))));
}

#[tokio::test]
async fn full_path_with_reject_round_trip() {
    let world = World::new();
    let h = world.harness();

    let r = h.service.initiate(new_for(&world, false), None).await.unwrap();
    let lines = world.products.iter().map(|p| complete_line(p.id)).collect();
    h.service.submit(r.id, Some(lines)).await.unwrap();
    h.service.authorize(r.id).await.unwrap();

    let rejected = h.service.reject(r.id).await.unwrap();
    assert_eq!(rejected.status, RequisitionStatus::Initiated);

    h.service.submit(r.id, None).await.unwrap();
    h.service.authorize(r.id).await.unwrap();
    let approved = h.service.approve(r.id).await.unwrap();
    assert_eq!(approved.status, RequisitionStatus::Approved);

    let err = h.service.reject(r.id).await.unwrap_err();
    assert!(matches!(err, RequisitionError::InvalidTransition(_)));
}

#[tokio::test]
async fn release_has_no_status_guard() {
    let world = World::new();
    let h = world.harness();

    let a = in_status(&world, RequisitionStatus::Initiated);
    let b = in_status(&world, RequisitionStatus::Approved);
    h.seed(&a).await.unwrap();
    h.seed(&b).await.unwrap();

    let released = h
        .service
        .release_requisitions_as_order(&[a.id, b.id])
        .await
        .unwrap();
    assert_eq!(
        released.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![a.id, b.id]
    );
    assert!(released
        .iter()
        .all(|r| r.status == RequisitionStatus::Released));
}

#[tokio::test]
async fn release_batch_is_not_atomic() {
    let world = World::new();
    let h = world.harness();

    let a = in_status(&world, RequisitionStatus::Approved);
    h.seed(&a).await.unwrap();

    let res = h
        .service
        .release_requisitions_as_order(&[a.id, Uuid::new_v4()])
        .await;
    assert!(matches!(res, Err(RequisitionError::NotFound(_))));
    assert_eq!(
        h.service.get(a.id).await.unwrap().status,
        RequisitionStatus::Released
    );
}
