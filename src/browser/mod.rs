//! Browser automation module
//!
//! This module obtains client-rendered HTML from a visible browser: binary
//! resolution, session lifecycle, the devtools copy sequence and the
//! OS input/clipboard capability it runs on.

pub mod acquirer;
pub mod automation;
pub mod desktop;
pub mod resolver;
pub mod session;

pub use acquirer::{DevtoolsAcquirer, HtmlAcquirer};
pub use desktop::{native_desktop, Desktop, MenuKey, Modifier};
pub use resolver::{DriverResolver, ResolvedBinaries};
pub use session::{BrowserSession, ChromiumLauncher, PageSession, SessionLauncher};
