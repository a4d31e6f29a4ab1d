pub mod pages;

pub use pages::PageService;
