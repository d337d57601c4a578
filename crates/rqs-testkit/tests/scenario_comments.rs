//! Scenario: requisition comments
//!
//! # Coverage
//! 1. add_comment returns the full list in creation order with author and
//!    requisition projections.
//! 2. An author missing from reference data projects as an id-only user.
//! 3. get/update/delete by comment id; update keeps the requisition link.
//! 4. Deleting a requisition removes its comments.
//! 5. Unknown requisition or comment ids are NotFound.

use rqs_schemas::Requisition;
use rqs_service::RequisitionError;
use rqs_testkit::World;
use uuid::Uuid;

async fn seeded(h: &rqs_testkit::Harness, world: &World) -> Requisition {
    let r = Requisition::initiated(
        world.facility1.id,
        world.program1.id,
        world.period.id,
        false,
    );
    h.seed(&r).await.unwrap();
    r
}

#[tokio::test]
async fn comments_list_in_creation_order() {
    let world = World::new();
    let h = world.harness();
    let r = seeded(&h, &world).await;

    h.service
        .add_comment(r.id, world.clerk.id, "first".to_string())
        .await
        .unwrap();
    let all = h
        .service
        .add_comment(r.id, world.approver.id, "second".to_string())
        .await
        .unwrap();

    let texts: Vec<&str> = all.iter().map(|c| c.comment_text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert_eq!(all[1].author.username.as_deref(), Some("approver"));
    assert_eq!(all[1].author.first_name.as_deref(), Some("Ada"));
    assert_eq!(all[0].requisition.id, r.id);
    assert_eq!(all[0].requisition.status, r.status);

    assert_eq!(h.service.list_comments(r.id).await.unwrap(), all);
}

#[tokio::test]
async fn unknown_author_projects_id_only() {
    let world = World::new();
    let h = world.harness();
    let r = seeded(&h, &world).await;

    let stranger = Uuid::new_v4();
    let all = h
        .service
        .add_comment(r.id, stranger, "hello".to_string())
        .await
        .unwrap();
    assert_eq!(all[0].author.id, stranger);
    assert!(all[0].author.username.is_none());
}

#[tokio::test]
async fn get_update_delete_by_comment_id() {
    let world = World::new();
    let h = world.harness();
    let r = seeded(&h, &world).await;

    let added = h
        .service
        .add_comment(r.id, world.clerk.id, "draft".to_string())
        .await
        .unwrap();
    let id = added[0].id;

    assert_eq!(h.service.get_comment(id).await.unwrap().comment_text, "draft");

    let updated = h
        .service
        .update_comment(id, world.approver.id, "final".to_string())
        .await
        .unwrap();
    assert_eq!(updated.comment_text, "final");
    assert_eq!(updated.author.id, world.approver.id);
    assert_eq!(updated.requisition.id, r.id);

    h.service.delete_comment(id).await.unwrap();
    assert!(matches!(
        h.service.get_comment(id).await,
        Err(RequisitionError::NotFound(_))
    ));
    assert!(matches!(
        h.service.delete_comment(id).await,
        Err(RequisitionError::NotFound(_))
    ));
}

#[tokio::test]
async fn deleting_requisition_drops_its_comments() {
    let world = World::new();
    let h = world.harness();
    let r = seeded(&h, &world).await;

    let added = h
        .service
        .add_comment(r.id, world.clerk.id, "bye".to_string())
        .await
        .unwrap();
    assert!(h.service.delete(r.id).await.unwrap());
    assert!(matches!(
        h.service.get_comment(added[0].id).await,
        Err(RequisitionError::NotFound(_))
    ));
}

#[tokio::test]
async fn comments_on_unknown_requisition_are_not_found() {
    let world = World::new();
    let h = world.harness();

    let err = h
        .service
        .add_comment(Uuid::new_v4(), world.clerk.id, "x".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, RequisitionError::NotFound(_)));
    assert!(matches!(
        h.service.list_comments(Uuid::new_v4()).await,
        Err(RequisitionError::NotFound(_))
    ));
}
