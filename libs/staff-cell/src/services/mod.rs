pub mod directory;

pub use directory::StaffDirectoryService;
