use axum_cart_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    middleware::auth::{ROLE_ADMIN, ROLE_USER},
    services::auth_service::hash_password,
    state::AppState,
};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "Admin", "admin@example.com", "admin123", ROLE_ADMIN).await?;
    let user_id = ensure_user(&pool, "Demo User", "user@example.com", "user123", ROLE_USER).await?;
    let products = seed_products(&pool).await?;

    let orm = create_orm_conn(&pool);
    let state = AppState::new(config, pool, orm);
    fill_cart(&state, user_id, &products).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<Vec<(Uuid, u32)>> {
    // (name, description, sku, price in cents, stock, quantity placed in the demo cart)
    let products = [
        ("Sample Product", "Reference item for cart totals", "SP001", 10000, 100, 2),
        ("Ferris Mug", "Coffee tastes better with Ferris", "MUG-01", 1999, 100, 1),
        ("Rust Sticker Pack", "Decorate your laptop with crabs", "STK-01", 450, 200, 0),
        ("Axum Hoodie", "Warm hoodie for Rustaceans", "HOOD-01", 5500, 50, 0),
    ];

    let mut in_cart = Vec::new();
    for (name, desc, sku, cents, stock, quantity) in products {
        let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE sku = $1")
            .bind(sku)
            .fetch_optional(pool)
            .await?;

        let id = match existing {
            Some((id,)) => {
                sqlx::query("UPDATE products SET is_active = TRUE WHERE id = $1")
                    .bind(id)
                    .execute(pool)
                    .await?;
                id
            }
            None => {
                let id = Uuid::new_v4();
                sqlx::query(
                    r#"
                    INSERT INTO products (id, name, description, sku, price, stock)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(id)
                .bind(name)
                .bind(desc)
                .bind(sku)
                .bind(Decimal::new(cents, 2))
                .bind(stock)
                .execute(pool)
                .await?;
                id
            }
        };

        if quantity > 0 {
            in_cart.push((id, quantity));
        }
    }

    println!("Seeded products");
    Ok(in_cart)
}

async fn fill_cart(state: &AppState, user_id: Uuid, items: &[(Uuid, u32)]) -> anyhow::Result<()> {
    let existing = state.carts.get(user_id).await?;
    if !existing.cart.is_empty() {
        state.carts.clear(user_id).await?;
    }

    let mut total = Decimal::ZERO;
    for &(product_id, quantity) in items {
        let cart = state.carts.add(user_id, product_id, quantity).await?;
        total = cart.total_price();
    }

    println!("Filled demo cart, total {total}");
    Ok(())
}
