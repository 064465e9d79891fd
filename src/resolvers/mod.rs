//! Resolution of matched resources into direct-download URLs
//!
//! A [`ResolverTable`] holds ordered [`ResolverRule`]s. The first rule whose
//! patterns accept a resource handles it, either with a pure URL rewrite or
//! with an async [`Resolver`] that talks to the host through
//! [`ResolveContext::fetch`].

mod builtin;
mod bunkr;
mod chevereto;
mod cyberfile;
pub mod extract;
mod galleries;
mod gofile;
mod imgur;
mod instagram;
mod page;
mod registry;
pub mod transform;
mod traits;
mod types;
mod video;
mod walk;
mod yandex;

#[cfg(test)]
pub(crate) mod testing;

pub use bunkr::{BunkrAlbum, BunkrFile};
pub use chevereto::ImageAlbum;
pub use cyberfile::{CyberfileFile, CyberfileFolder};
pub use galleries::{BoxFolder, CyberdropAlbum, EromeAlbum, Imagebam, ImgboxGallery, PixhostGallery};
pub use gofile::{Gofile, password_hash};
pub use imgur::Imgur;
pub use instagram::{InstagramEmbed, InstagramProfile};
pub use page::PageAttr;
pub use registry::{Handler, ResolverRule, ResolverTable, RuleError, TransformFn};
pub use traits::{ResolveContext, ResolveError, Resolver};
pub use types::{DownloadTarget, Resolved};
pub use video::{Gfycat, Noodlemagazine, Pornhub, Redgifs, Spankbang};
pub use walk::WorkQueue;
pub use yandex::YandexDisk;
