use crate::db::{get_connection, init_db};
use crate::error::Result;

use super::Context;

pub fn run(ctx: &Context) -> Result<()> {
    let conn = get_connection(&ctx.db_path)?;
    init_db(&conn)?;
    println!("Initialized database at {}", ctx.db_path.display());
    Ok(())
}
