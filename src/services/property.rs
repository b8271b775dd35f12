use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::error::PmsError;
use crate::models::property::{Company, CreateCompany, CreateProperty, Property, PropertySearch};
use crate::models::sale_channel::{Agency, CreateAgency, CreateSaleChannel, SaleChannel};

use super::pricing::{ensure_pricelist_applies, get_pricelist};

pub async fn create_company(
    conn: &mut SqliteConnection,
    input: &CreateCompany,
) -> Result<Company, PmsError> {
    let company = sqlx::query_as::<_, Company>(
        "INSERT INTO companies (name) VALUES (?) RETURNING *",
    )
    .bind(&input.name)
    .fetch_one(&mut *conn)
    .await?;
    Ok(company)
}

pub async fn list_companies(conn: &mut SqliteConnection) -> Result<Vec<Company>, PmsError> {
    let companies = sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;
    Ok(companies)
}

pub async fn create_property(
    conn: &mut SqliteConnection,
    input: &CreateProperty,
) -> Result<Property, PmsError> {
    let company: Option<i64> = sqlx::query_scalar("SELECT id FROM companies WHERE id = ?")
        .bind(input.company_id)
        .fetch_optional(&mut *conn)
        .await?;
    if company.is_none() {
        return Err(PmsError::not_found("company", input.company_id));
    }

    let property = sqlx::query_as::<_, Property>(
        r#"
        INSERT INTO properties (company_id, name, code, tax_rate, default_pricelist_id)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(input.company_id)
    .bind(&input.name)
    .bind(&input.code)
    .bind(input.tax_rate)
    .bind(input.default_pricelist_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match PmsError::from(e) {
        PmsError::Conflict(_) => PmsError::Conflict(format!(
            "Property code '{}' already exists in company {}",
            input.code, input.company_id
        )),
        other => other,
    })?;

    log::info!("Created property {} ({})", property.id, property.code);
    Ok(property)
}

pub async fn get_property(conn: &mut SqliteConnection, id: i64) -> Result<Property, PmsError> {
    sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| PmsError::not_found("property", id))
}

pub async fn list_properties(
    conn: &mut SqliteConnection,
    search: &PropertySearch,
) -> Result<Vec<Property>, PmsError> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM properties WHERE 1=1");

    if let Some(company_id) = search.company_id {
        query.push(" AND company_id = ").push_bind(company_id);
    }
    if let Some(name) = &search.name {
        query.push(" AND name LIKE ").push_bind(format!("%{}%", name));
    }
    query.push(" ORDER BY id");

    let properties = query
        .build_query_as::<Property>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(properties)
}

pub async fn set_default_pricelist(
    conn: &mut SqliteConnection,
    property_id: i64,
    pricelist_id: i64,
) -> Result<Property, PmsError> {
    let property = get_property(conn, property_id).await?;
    let pricelist = get_pricelist(conn, pricelist_id).await?;
    ensure_pricelist_applies(&pricelist, property.id)?;

    let property = sqlx::query_as::<_, Property>(
        "UPDATE properties SET default_pricelist_id = ? WHERE id = ? RETURNING *",
    )
    .bind(pricelist.id)
    .bind(property.id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(property)
}

pub async fn create_sale_channel(
    conn: &mut SqliteConnection,
    input: &CreateSaleChannel,
) -> Result<SaleChannel, PmsError> {
    let channel = sqlx::query_as::<_, SaleChannel>(
        "INSERT INTO sale_channels (name, channel_type) VALUES (?, ?) RETURNING *",
    )
    .bind(&input.name)
    .bind(input.channel_type)
    .fetch_one(&mut *conn)
    .await?;
    Ok(channel)
}

pub async fn list_sale_channels(conn: &mut SqliteConnection) -> Result<Vec<SaleChannel>, PmsError> {
    let channels = sqlx::query_as::<_, SaleChannel>("SELECT * FROM sale_channels ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;
    Ok(channels)
}

pub async fn create_agency(
    conn: &mut SqliteConnection,
    input: &CreateAgency,
) -> Result<Agency, PmsError> {
    if let Some(channel_id) = input.sale_channel_id {
        let channel = get_sale_channel(conn, channel_id).await?;
        if channel.channel_type != crate::models::sale_channel::ChannelType::Indirect {
            return Err(PmsError::UserError(format!(
                "Agency sale channel '{}' must be indirect",
                channel.name
            )));
        }
    }

    let agency = sqlx::query_as::<_, Agency>(
        r#"
        INSERT INTO agencies (name, commission, sale_channel_id, invoice_to_agency)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.name)
    .bind(input.commission)
    .bind(input.sale_channel_id)
    .bind(input.invoice_to_agency)
    .fetch_one(&mut *conn)
    .await?;
    Ok(agency)
}

pub async fn get_sale_channel(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<SaleChannel, PmsError> {
    sqlx::query_as::<_, SaleChannel>("SELECT * FROM sale_channels WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| PmsError::not_found("sale channel", id))
}

pub async fn get_agency(conn: &mut SqliteConnection, id: i64) -> Result<Agency, PmsError> {
    sqlx::query_as::<_, Agency>("SELECT * FROM agencies WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| PmsError::not_found("agency", id))
}

pub async fn list_agencies(conn: &mut SqliteConnection) -> Result<Vec<Agency>, PmsError> {
    let agencies = sqlx::query_as::<_, Agency>("SELECT * FROM agencies ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;
    Ok(agencies)
}
