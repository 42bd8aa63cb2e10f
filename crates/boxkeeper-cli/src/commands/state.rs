use super::print_json;
use crate::session::{Paths, Session};

pub fn run(paths: &Paths) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open(paths)?;
    session.tick();
    print_json(&*session.state())
}
