use crate::common::{open_session, CmdResult};

pub fn run(yes: bool) -> CmdResult {
    if !yes {
        return Err("this erases every slot; pass --yes to confirm".into());
    }
    let mut session = open_session()?;
    session.reset_progress()?;
    println!("Progress reset.");
    Ok(())
}
