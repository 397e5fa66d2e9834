use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let create_table_sql = r#"
            CREATE TABLE IF NOT EXISTS rest_ws.posts (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                post_content TEXT NOT NULL,
                user_id UUID NOT NULL REFERENCES rest_ws.users(id) ON DELETE CASCADE,

                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_table_sql)
            .await?;

        // Listing pages newest first
        manager
            .create_index(
                Index::create()
                    .name("posts_created_at_idx")
                    .table((Alias::new("rest_ws"), Alias::new("posts")))
                    .col((Alias::new("created_at"), IndexOrder::Desc))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("posts_user_id_idx")
                    .table((Alias::new("rest_ws"), Alias::new("posts")))
                    .col(Alias::new("user_id"))
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table((Alias::new("rest_ws"), Alias::new("posts")))
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}
