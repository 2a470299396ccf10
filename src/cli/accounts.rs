use comfy_table::{Cell, Table};

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::store::list_accounts;

use super::Context;

pub fn list(ctx: &Context) -> Result<()> {
    let conn = get_connection(&ctx.db_path)?;
    init_db(&conn)?;
    let rows = list_accounts(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Currency", "Institution", "Transactions"]);
    for (account, count) in rows {
        table.add_row(vec![
            Cell::new(account.id),
            Cell::new(account.name),
            Cell::new(account.currency),
            Cell::new(account.institution),
            Cell::new(count),
        ]);
    }
    println!("Accounts\n{table}");
    Ok(())
}
