use crate::error::{refdata_err, store_err};
use crate::{RequisitionError, RequisitionService, ServiceResult};
use rqs_schemas::{Comment, CommentView, Requisition, UserBasic};
use tracing::debug;
use uuid::Uuid;

impl RequisitionService {
    /// Append a comment. Returns the requisition's full comment list.
    pub async fn add_comment(
        &self,
        requisition: Uuid,
        author: Uuid,
        text: String,
    ) -> ServiceResult<Vec<CommentView>> {
        let r = self.load(requisition).await?;
        let comment = Comment::new(r.id, author, text);
        self.store.save_comment(&comment).await.map_err(store_err)?;
        debug!(requisition = %r.id, comment = %comment.id, "comment added");
        self.views_for(&r).await
    }

    /// Comments in creation order.
    pub async fn list_comments(&self, requisition: Uuid) -> ServiceResult<Vec<CommentView>> {
        let r = self.load(requisition).await?;
        self.views_for(&r).await
    }

    pub async fn get_comment(&self, id: Uuid) -> ServiceResult<CommentView> {
        let c = self.load_comment(id).await?;
        self.view(c).await
    }

    /// New text and author; the requisition link is kept.
    pub async fn update_comment(
        &self,
        id: Uuid,
        author: Uuid,
        text: String,
    ) -> ServiceResult<CommentView> {
        let mut c = self.load_comment(id).await?;
        c.author = author;
        c.comment_text = text;
        self.store.save_comment(&c).await.map_err(store_err)?;
        debug!(comment = %id, "comment updated");
        self.view(c).await
    }

    pub async fn delete_comment(&self, id: Uuid) -> ServiceResult<()> {
        if !self.store.delete_comment(id).await.map_err(store_err)? {
            return Err(RequisitionError::not_found("comment", id));
        }
        debug!(comment = %id, "comment deleted");
        Ok(())
    }

    async fn load_comment(&self, id: Uuid) -> ServiceResult<Comment> {
        self.store
            .find_comment(id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| RequisitionError::not_found("comment", id))
    }

    async fn views_for(&self, r: &Requisition) -> ServiceResult<Vec<CommentView>> {
        let comments = self.store.comments_for(r.id).await.map_err(store_err)?;
        let mut out = Vec::with_capacity(comments.len());
        for c in comments {
            let author = self.author(c.author).await?;
            out.push(project(c, author, r));
        }
        Ok(out)
    }

    async fn view(&self, c: Comment) -> ServiceResult<CommentView> {
        let r = self.load(c.requisition).await?;
        let author = self.author(c.author).await?;
        Ok(project(c, author, &r))
    }

    async fn author(&self, id: Uuid) -> ServiceResult<UserBasic> {
        Ok(self
            .refdata
            .user(id)
            .await
            .map_err(refdata_err)?
            .map(|u| u.basic_information())
            .unwrap_or_else(|| UserBasic::unknown(id)))
    }
}

fn project(c: Comment, author: UserBasic, r: &Requisition) -> CommentView {
    CommentView {
        id: c.id,
        author,
        requisition: r.basic_information(),
        comment_text: c.comment_text,
        created_date: c.created_date,
    }
}
