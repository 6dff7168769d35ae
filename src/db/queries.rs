use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use rusqlite::{params, Connection};

use crate::models::{
    Booking, BookingStatus, Customer, PaymentMethod, Sale, SaleStatus, Service, ServiceStatus,
    Staff, StaffStatus,
};

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M:%S";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FMT).unwrap_or_else(|_| Utc::now().date_naive())
}

fn parse_time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, TIME_FMT)
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .unwrap_or_default()
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}

fn parse_decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap_or_default()
}

// ── Bookings ──

const BOOKING_COLS: &str = "id, customer_id, staff_id, service_id, booking_date, start_time, \
     end_time, total_price, status, notes, is_deleted, deleted_at, created_at, updated_at";

fn parse_booking_row(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
    let booking_date: String = row.get(4)?;
    let start_time: String = row.get(5)?;
    let end_time: String = row.get(6)?;
    let total_price: String = row.get(7)?;
    let status: String = row.get(8)?;
    let deleted_at: Option<String> = row.get(11)?;
    let created_at: String = row.get(12)?;
    let updated_at: String = row.get(13)?;

    Ok(Booking {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        staff_id: row.get(2)?,
        service_id: row.get(3)?,
        booking_date: parse_date(&booking_date),
        start_time: parse_time(&start_time),
        end_time: parse_time(&end_time),
        total_price: parse_decimal(&total_price),
        status: BookingStatus::parse(&status),
        notes: row.get(9)?,
        is_deleted: row.get::<_, i32>(10)? != 0,
        deleted_at: deleted_at.as_deref().map(parse_datetime),
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO bookings (customer_id, staff_id, service_id, booking_date, start_time, end_time, total_price, status, notes, is_deleted, deleted_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            booking.customer_id,
            booking.staff_id,
            booking.service_id,
            booking.booking_date.format(DATE_FMT).to_string(),
            booking.start_time.format(TIME_FMT).to_string(),
            booking.end_time.format(TIME_FMT).to_string(),
            booking.total_price.to_string(),
            booking.status.as_str(),
            booking.notes,
            booking.is_deleted as i32,
            booking.deleted_at.map(|d| d.format(DATETIME_FMT).to_string()),
            booking.created_at.format(DATETIME_FMT).to_string(),
            booking.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn save_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE bookings SET customer_id = ?1, staff_id = ?2, service_id = ?3, booking_date = ?4,
             start_time = ?5, end_time = ?6, total_price = ?7, status = ?8, notes = ?9,
             is_deleted = ?10, deleted_at = ?11, updated_at = ?12
         WHERE id = ?13",
        params![
            booking.customer_id,
            booking.staff_id,
            booking.service_id,
            booking.booking_date.format(DATE_FMT).to_string(),
            booking.start_time.format(TIME_FMT).to_string(),
            booking.end_time.format(TIME_FMT).to_string(),
            booking.total_price.to_string(),
            booking.status.as_str(),
            booking.notes,
            booking.is_deleted as i32,
            booking.deleted_at.map(|d| d.format(DATETIME_FMT).to_string()),
            booking.updated_at.format(DATETIME_FMT).to_string(),
            booking.id,
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: i64) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLS} FROM bookings WHERE id = ?1"),
        params![id],
        parse_booking_row,
    );

    match result {
        Ok(booking) => Ok(Some(booking)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub struct BookingFilter<'a> {
    pub status: Option<&'a str>,
    pub staff_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub include_deleted: bool,
    pub limit: i64,
}

pub fn list_bookings(conn: &Connection, filter: &BookingFilter) -> anyhow::Result<Vec<Booking>> {
    let mut sql = format!("SELECT {BOOKING_COLS} FROM bookings WHERE 1=1");
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if !filter.include_deleted {
        sql.push_str(" AND is_deleted = 0");
    }
    if let Some(status) = filter.status {
        params_vec.push(Box::new(status.to_string()));
        sql.push_str(&format!(" AND status = ?{}", params_vec.len()));
    }
    if let Some(staff_id) = filter.staff_id {
        params_vec.push(Box::new(staff_id));
        sql.push_str(&format!(" AND staff_id = ?{}", params_vec.len()));
    }
    if let Some(date) = filter.date {
        params_vec.push(Box::new(date.format(DATE_FMT).to_string()));
        sql.push_str(&format!(" AND booking_date = ?{}", params_vec.len()));
    }
    params_vec.push(Box::new(filter.limit));
    sql.push_str(&format!(
        " ORDER BY booking_date DESC, start_time DESC LIMIT ?{}",
        params_vec.len()
    ));

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

/// Active (non-cancelled, non-deleted) bookings for one staff member on one
/// date, the candidate set for the overlap check.
pub fn get_active_bookings_for_staff(
    conn: &Connection,
    staff_id: i64,
    date: NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLS} FROM bookings
         WHERE staff_id = ?1 AND booking_date = ?2 AND status != 'cancelled' AND is_deleted = 0
         ORDER BY start_time ASC"
    ))?;

    let rows = stmt.query_map(
        params![staff_id, date.format(DATE_FMT).to_string()],
        parse_booking_row,
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

/// True when the proposed [start, end) window for this staff member and date
/// intersects an existing active booking. Three clauses per candidate:
/// the proposed start falls inside it, the proposed end falls inside it, or
/// the proposed window fully encloses it. Touching endpoints do not conflict.
pub fn exists_overlapping_booking(
    conn: &Connection,
    staff_id: i64,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    exclude_booking_id: Option<i64>,
) -> anyhow::Result<bool> {
    let candidates = get_active_bookings_for_staff(conn, staff_id, date)?;

    for candidate in &candidates {
        if exclude_booking_id == Some(candidate.id) {
            continue;
        }

        let starts_inside = candidate.start_time <= start && start < candidate.end_time;
        let ends_inside = candidate.start_time < end && end <= candidate.end_time;
        let encloses = start <= candidate.start_time && end >= candidate.end_time;

        if starts_inside || ends_inside || encloses {
            return Ok(true);
        }
    }

    Ok(false)
}

// ── Customers ──

const CUSTOMER_COLS: &str =
    "id, first_name, last_name, phone, email, notes, is_deleted, deleted_at, created_at, updated_at";

fn parse_customer_row(row: &rusqlite::Row) -> rusqlite::Result<Customer> {
    let deleted_at: Option<String> = row.get(7)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;

    Ok(Customer {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        notes: row.get(5)?,
        is_deleted: row.get::<_, i32>(6)? != 0,
        deleted_at: deleted_at.as_deref().map(parse_datetime),
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

pub fn insert_customer(conn: &Connection, customer: &Customer) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO customers (first_name, last_name, phone, email, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            customer.first_name,
            customer.last_name,
            customer.phone,
            customer.email,
            customer.notes,
            customer.created_at.format(DATETIME_FMT).to_string(),
            customer.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn save_customer(conn: &Connection, customer: &Customer) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE customers SET first_name = ?1, last_name = ?2, phone = ?3, email = ?4, notes = ?5,
             is_deleted = ?6, deleted_at = ?7, updated_at = ?8
         WHERE id = ?9",
        params![
            customer.first_name,
            customer.last_name,
            customer.phone,
            customer.email,
            customer.notes,
            customer.is_deleted as i32,
            customer.deleted_at.map(|d| d.format(DATETIME_FMT).to_string()),
            customer.updated_at.format(DATETIME_FMT).to_string(),
            customer.id,
        ],
    )?;
    Ok(())
}

pub fn get_customer_by_id(conn: &Connection, id: i64) -> anyhow::Result<Option<Customer>> {
    let result = conn.query_row(
        &format!("SELECT {CUSTOMER_COLS} FROM customers WHERE id = ?1"),
        params![id],
        parse_customer_row,
    );

    match result {
        Ok(customer) => Ok(Some(customer)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_customers(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Customer>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CUSTOMER_COLS} FROM customers WHERE is_deleted = 0 ORDER BY last_name, first_name LIMIT ?1"
    ))?;
    let rows = stmt.query_map(params![limit], parse_customer_row)?;

    let mut customers = vec![];
    for row in rows {
        customers.push(row?);
    }
    Ok(customers)
}

// ── Staff ──

const STAFF_COLS: &str = "id, first_name, last_name, phone, email, role, status, is_deleted, deleted_at, created_at, updated_at";

fn parse_staff_row(row: &rusqlite::Row) -> rusqlite::Result<Staff> {
    let status: String = row.get(6)?;
    let deleted_at: Option<String> = row.get(8)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok(Staff {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        role: row.get(5)?,
        status: StaffStatus::parse(&status),
        is_deleted: row.get::<_, i32>(7)? != 0,
        deleted_at: deleted_at.as_deref().map(parse_datetime),
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

pub fn insert_staff(conn: &Connection, staff: &Staff) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO staff (first_name, last_name, phone, email, role, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            staff.first_name,
            staff.last_name,
            staff.phone,
            staff.email,
            staff.role,
            staff.status.as_str(),
            staff.created_at.format(DATETIME_FMT).to_string(),
            staff.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn save_staff(conn: &Connection, staff: &Staff) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE staff SET first_name = ?1, last_name = ?2, phone = ?3, email = ?4, role = ?5,
             status = ?6, is_deleted = ?7, deleted_at = ?8, updated_at = ?9
         WHERE id = ?10",
        params![
            staff.first_name,
            staff.last_name,
            staff.phone,
            staff.email,
            staff.role,
            staff.status.as_str(),
            staff.is_deleted as i32,
            staff.deleted_at.map(|d| d.format(DATETIME_FMT).to_string()),
            staff.updated_at.format(DATETIME_FMT).to_string(),
            staff.id,
        ],
    )?;
    Ok(())
}

pub fn get_staff_by_id(conn: &Connection, id: i64) -> anyhow::Result<Option<Staff>> {
    let result = conn.query_row(
        &format!("SELECT {STAFF_COLS} FROM staff WHERE id = ?1"),
        params![id],
        parse_staff_row,
    );

    match result {
        Ok(staff) => Ok(Some(staff)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_staff(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Staff>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {STAFF_COLS} FROM staff WHERE is_deleted = 0 ORDER BY last_name, first_name LIMIT ?1"
    ))?;
    let rows = stmt.query_map(params![limit], parse_staff_row)?;

    let mut staff = vec![];
    for row in rows {
        staff.push(row?);
    }
    Ok(staff)
}

// ── Services ──

const SERVICE_COLS: &str = "id, name, description, duration_minutes, base_price, status, is_deleted, deleted_at, created_at, updated_at";

fn parse_service_row(row: &rusqlite::Row) -> rusqlite::Result<Service> {
    let base_price: String = row.get(4)?;
    let status: String = row.get(5)?;
    let deleted_at: Option<String> = row.get(7)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;

    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        duration_minutes: row.get(3)?,
        base_price: parse_decimal(&base_price),
        status: ServiceStatus::parse(&status),
        is_deleted: row.get::<_, i32>(6)? != 0,
        deleted_at: deleted_at.as_deref().map(parse_datetime),
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

pub fn insert_service(conn: &Connection, service: &Service) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO services (name, description, duration_minutes, base_price, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            service.name,
            service.description,
            service.duration_minutes,
            service.base_price.to_string(),
            service.status.as_str(),
            service.created_at.format(DATETIME_FMT).to_string(),
            service.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn save_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE services SET name = ?1, description = ?2, duration_minutes = ?3, base_price = ?4,
             status = ?5, is_deleted = ?6, deleted_at = ?7, updated_at = ?8
         WHERE id = ?9",
        params![
            service.name,
            service.description,
            service.duration_minutes,
            service.base_price.to_string(),
            service.status.as_str(),
            service.is_deleted as i32,
            service.deleted_at.map(|d| d.format(DATETIME_FMT).to_string()),
            service.updated_at.format(DATETIME_FMT).to_string(),
            service.id,
        ],
    )?;
    Ok(())
}

pub fn get_service_by_id(conn: &Connection, id: i64) -> anyhow::Result<Option<Service>> {
    let result = conn.query_row(
        &format!("SELECT {SERVICE_COLS} FROM services WHERE id = ?1"),
        params![id],
        parse_service_row,
    );

    match result {
        Ok(service) => Ok(Some(service)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_services(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SERVICE_COLS} FROM services WHERE is_deleted = 0 ORDER BY name LIMIT ?1"
    ))?;
    let rows = stmt.query_map(params![limit], parse_service_row)?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

// ── Sales ──

const SALE_COLS: &str =
    "id, booking_id, customer_id, amount, payment_method, status, created_at, updated_at";

fn parse_sale_row(row: &rusqlite::Row) -> rusqlite::Result<Sale> {
    let amount: String = row.get(3)?;
    let payment_method: String = row.get(4)?;
    let status: String = row.get(5)?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;

    Ok(Sale {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        customer_id: row.get(2)?,
        amount: parse_decimal(&amount),
        payment_method: PaymentMethod::parse(&payment_method),
        status: SaleStatus::parse(&status),
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

pub fn insert_sale(conn: &Connection, sale: &Sale) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO sales (booking_id, customer_id, amount, payment_method, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            sale.booking_id,
            sale.customer_id,
            sale.amount.to_string(),
            sale.payment_method.as_str(),
            sale.status.as_str(),
            sale.created_at.format(DATETIME_FMT).to_string(),
            sale.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn save_sale(conn: &Connection, sale: &Sale) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE sales SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![
            sale.status.as_str(),
            sale.updated_at.format(DATETIME_FMT).to_string(),
            sale.id,
        ],
    )?;
    Ok(())
}

pub fn get_sale_by_id(conn: &Connection, id: i64) -> anyhow::Result<Option<Sale>> {
    let result = conn.query_row(
        &format!("SELECT {SALE_COLS} FROM sales WHERE id = ?1"),
        params![id],
        parse_sale_row,
    );

    match result {
        Ok(sale) => Ok(Some(sale)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_sales(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Sale>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SALE_COLS} FROM sales ORDER BY created_at DESC LIMIT ?1"
    ))?;
    let rows = stmt.query_map(params![limit], parse_sale_row)?;

    let mut sales = vec![];
    for row in rows {
        sales.push(row?);
    }
    Ok(sales)
}

// ── Audit log ──

pub struct AuditEntry {
    pub id: i64,
    pub entity_name: String,
    pub entity_id: i64,
    pub action: String,
    pub description: String,
    pub actor: String,
    pub old_values: Option<String>,
    pub new_values: Option<String>,
    pub created_at: String,
}

#[allow(clippy::too_many_arguments)]
pub fn insert_audit_entry(
    conn: &Connection,
    entity_name: &str,
    entity_id: i64,
    action: &str,
    description: &str,
    actor: &str,
    old_values: Option<&str>,
    new_values: Option<&str>,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO audit_log (entity_name, entity_id, action, description, actor, old_values, new_values)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![entity_name, entity_id, action, description, actor, old_values, new_values],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_audit_entries(conn: &Connection, limit: i64) -> anyhow::Result<Vec<AuditEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, entity_name, entity_id, action, description, actor, old_values, new_values, created_at
         FROM audit_log ORDER BY id DESC LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        Ok(AuditEntry {
            id: row.get(0)?,
            entity_name: row.get(1)?,
            entity_id: row.get(2)?,
            action: row.get(3)?,
            description: row.get(4)?,
            actor: row.get(5)?,
            old_values: row.get(6)?,
            new_values: row.get(7)?,
            created_at: row.get(8)?,
        })
    })?;

    let mut entries = vec![];
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}

// ── Dashboard stats ──

pub struct DashboardStats {
    pub bookings_today: i64,
    pub upcoming_bookings: i64,
    pub active_customers: i64,
    pub revenue_this_month: Decimal,
}

pub fn get_dashboard_stats(conn: &Connection, today: NaiveDate) -> anyhow::Result<DashboardStats> {
    let today_str = today.format(DATE_FMT).to_string();
    let month_prefix = today.format("%Y-%m").to_string();

    let bookings_today: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM bookings
             WHERE booking_date = ?1 AND status != 'cancelled' AND is_deleted = 0",
            params![today_str],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let upcoming_bookings: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM bookings
             WHERE booking_date >= ?1 AND status IN ('pending', 'confirmed') AND is_deleted = 0",
            params![today_str],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let active_customers: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM customers WHERE is_deleted = 0",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    // Decimal sums stay out of SQL; amounts are TEXT so SUM would go through
    // SQLite float math.
    let mut stmt = conn.prepare(
        "SELECT amount FROM sales WHERE status = 'paid' AND created_at LIKE ?1 || '%'",
    )?;
    let rows = stmt.query_map(params![month_prefix], |row| row.get::<_, String>(0))?;
    let mut revenue_this_month = Decimal::ZERO;
    for row in rows {
        revenue_this_month += parse_decimal(&row?);
    }

    Ok(DashboardStats {
        bookings_today,
        upcoming_bookings,
        active_customers,
        revenue_this_month,
    })
}
