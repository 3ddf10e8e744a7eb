use anyhow::Result;
use app_utils::AnySource;
use librollcall::attendance::AttendanceService;

use crate::templates::Templates;

pub struct AppState {
    pub attendance: AttendanceService<AnySource>,
    pub(crate) templates: Templates,
}

impl AppState {
    pub fn new(attendance: AttendanceService<AnySource>) -> Result<Self> {
        Ok(Self {
            attendance,
            templates: Templates::new()?,
        })
    }
}
