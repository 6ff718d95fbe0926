//! SurrealDB Schema Bootstrap
//!
//! 启动时幂等执行：表结构、字段约束与唯一索引。
//! 嵌套结构 (订单条目、收货地址、支付详情) 用 FLEXIBLE 保持 SCHEMAFULL 下的自由形状。

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::repository::RepoResult;

/// Define all tables, field constraints and indexes (idempotent)
pub async fn init_schema(db: &Surreal<Db>) -> RepoResult<()> {
    db.query(
        r#"
        DEFINE TABLE IF NOT EXISTS user SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS username ON user TYPE string;
        DEFINE FIELD IF NOT EXISTS email ON user TYPE string ASSERT string::is::email($value);
        DEFINE FIELD IF NOT EXISTS hash_pass ON user TYPE string;
        DEFINE FIELD IF NOT EXISTS role ON user TYPE string ASSERT $value IN ['admin', 'customer'];
        DEFINE FIELD IF NOT EXISTS created_at ON user TYPE int;
        DEFINE INDEX IF NOT EXISTS user_username ON user FIELDS username UNIQUE;
        DEFINE INDEX IF NOT EXISTS user_email ON user FIELDS email UNIQUE;
        "#,
    )
    .await?
    .check()?;

    db.query(
        r#"
        DEFINE TABLE IF NOT EXISTS product SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS name ON product TYPE string;
        DEFINE FIELD IF NOT EXISTS description ON product TYPE string;
        DEFINE FIELD IF NOT EXISTS price ON product TYPE number ASSERT $value >= 0;
        DEFINE FIELD IF NOT EXISTS stock ON product TYPE int ASSERT $value >= 0;
        DEFINE FIELD IF NOT EXISTS category ON product TYPE string ASSERT $value IN ['smartphone', 'tablet', 'accessory'];
        DEFINE FIELD IF NOT EXISTS brand ON product TYPE string;
        DEFINE FIELD IF NOT EXISTS image_url ON product TYPE string;
        DEFINE FIELD IF NOT EXISTS ratings_average ON product TYPE number DEFAULT 0;
        DEFINE FIELD IF NOT EXISTS ratings_quantity ON product TYPE int DEFAULT 0;
        DEFINE FIELD IF NOT EXISTS created_by ON product TYPE option<record<user>>;
        DEFINE FIELD IF NOT EXISTS created_at ON product TYPE int;
        DEFINE INDEX IF NOT EXISTS product_category ON product FIELDS category;
        "#,
    )
    .await?
    .check()?;

    db.query(
        r#"
        DEFINE TABLE IF NOT EXISTS order SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS user ON order TYPE record<user>;
        DEFINE FIELD IF NOT EXISTS items ON order FLEXIBLE TYPE array ASSERT array::len($value) > 0;
        DEFINE FIELD IF NOT EXISTS total_amount ON order TYPE number ASSERT $value >= 0;
        DEFINE FIELD IF NOT EXISTS shipping_address ON order FLEXIBLE TYPE object;
        DEFINE FIELD IF NOT EXISTS status ON order TYPE string ASSERT $value IN ['pending', 'processing', 'shipped', 'delivered', 'cancelled'];
        DEFINE FIELD IF NOT EXISTS payment_method ON order TYPE string ASSERT $value IN ['credit_card', 'paypal', 'stripe'];
        DEFINE FIELD IF NOT EXISTS payment_status ON order TYPE string ASSERT $value IN ['pending', 'paid', 'failed'];
        DEFINE FIELD IF NOT EXISTS payment_details ON order FLEXIBLE TYPE option<object>;
        DEFINE FIELD IF NOT EXISTS created_at ON order TYPE int;
        DEFINE FIELD IF NOT EXISTS updated_at ON order TYPE int;
        DEFINE INDEX IF NOT EXISTS order_user ON order FIELDS user;
        "#,
    )
    .await?
    .check()?;

    db.query(
        r#"
        DEFINE TABLE IF NOT EXISTS review SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS user ON review TYPE record<user>;
        DEFINE FIELD IF NOT EXISTS product ON review TYPE record<product>;
        DEFINE FIELD IF NOT EXISTS rating ON review TYPE int ASSERT $value >= 1 AND $value <= 5;
        DEFINE FIELD IF NOT EXISTS comment ON review TYPE string ASSERT string::len($value) <= 500;
        DEFINE FIELD IF NOT EXISTS created_at ON review TYPE int;
        DEFINE FIELD IF NOT EXISTS updated_at ON review TYPE int;
        DEFINE INDEX IF NOT EXISTS review_user_product ON review FIELDS user, product UNIQUE;
        "#,
    )
    .await?
    .check()?;

    Ok(())
}
