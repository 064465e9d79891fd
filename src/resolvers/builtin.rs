//! The builtin resolver table.
//!
//! Rules are tried top to bottom. A rule listing several patterns fires
//! only when the first matches and none of the others do, which keeps
//! single-file rules away from the album URLs handled by the next rule.

use super::bunkr::{BunkrAlbum, BunkrFile};
use super::chevereto::ImageAlbum;
use super::cyberfile::{CyberfileFile, CyberfileFolder};
use super::galleries::{BoxFolder, CyberdropAlbum, EromeAlbum, ImgboxGallery, Imagebam, PixhostGallery};
use super::gofile::Gofile;
use super::imgur::Imgur;
use super::instagram::{InstagramEmbed, InstagramProfile};
use super::page::PageAttr;
use super::registry::{ResolverRule, RuleError};
use super::transform;
use super::video::{Gfycat, Noodlemagazine, Pornhub, Redgifs, Spankbang};
use super::yandex::YandexDisk;

pub fn rules() -> Result<Vec<ResolverRule>, RuleError> {
    Ok(vec![
        ResolverRule::transform("jpg.church", &[r"jpg\.church/", r"jpg\.church/a/"], transform::chevereto_full_size)?,
        ResolverRule::pipeline(
            "jpg.church album",
            &[r"jpg\.church/a/"],
            ImageAlbum::paginated(".list-item-image > a > img", r#"a[data-pagination="next"]"#).without_query(),
        )?,
        ResolverRule::pipeline(
            "ibb.co",
            &[
                r"(?:[a-z]\d*\.)?ibb\.co/[a-zA-Z0-9_.-]+",
                r"(?:[a-z]\d*\.)?ibb\.co/[a-zA-Z0-9_.-]+/[a-zA-Z0-9_.-]+",
            ],
            PageAttr::new(".image-viewer-container > img", "src"),
        )?,
        ResolverRule::pipeline(
            "ibb.co album",
            &[r"(?:[a-z]\d*\.)?ibb\.co/album/[a-zA-Z0-9_.-]+"],
            ImageAlbum::single_page(".image-container > img"),
        )?,
        ResolverRule::transform(
            "pixl",
            &[r"[a-z]\d+\.pixl\.(?:is|to)/(?:(?:img|image)/)?", r"pixl\.(?:is|to)/album/"],
            transform::chevereto_full_size,
        )?,
        ResolverRule::pipeline(
            "pixl album",
            &[r"pixl\.(?:is|to)/album/"],
            ImageAlbum::paginated(".image-container > img", ".pagination-next > a"),
        )?,
        ResolverRule::transform(
            "pixhost",
            &[r"t\d*\.pixhost\.to/", r"pixhost\.to/gallery/"],
            transform::pixhost_full_size,
        )?,
        ResolverRule::pipeline("pixhost gallery", &[r"pixhost\.to/gallery/"], PixhostGallery)?,
        ResolverRule::pipeline(
            "bunkr",
            &[r"(?:stream|cdn\d*|i\d*)\.bunkr\.is/(?:v/)?", r"bunkr\.is/a/"],
            BunkrFile,
        )?,
        ResolverRule::pipeline("bunkr album", &[r"bunkr\.is/a/"], BunkrAlbum)?,
        ResolverRule::transform("pixeldrain", &[r"pixeldrain\.com/[ul]"], transform::pixeldrain_api)?,
        ResolverRule::pipeline("anonfiles", &[r"anonfiles\.com/"], PageAttr::new("#download-url", "href"))?,
        ResolverRule::pipeline("pornhub", &[r"(?:[a-z0-9]+\.)?pornhub\.com/view_video"], Pornhub)?,
        ResolverRule::pipeline("gofile", &[r"gofile\.io/d"], Gofile::default())?,
        ResolverRule::pipeline("erome", &[r"erome\.com/a/"], EromeAlbum)?,
        ResolverRule::pipeline("cyberfile", &[r"cyberfile\.is/", r"cyberfile\.is/folder/"], CyberfileFile)?,
        ResolverRule::pipeline("cyberfile folder", &[r"cyberfile\.is/folder/"], CyberfileFolder)?,
        ResolverRule::transform("saint", &[r"(?:[a-z0-9]+\.)?saint\.to/videos"], transform::identity)?,
        ResolverRule::pipeline("saint embed", &[r"saint\.to/embed"], PageAttr::new("source", "src"))?,
        ResolverRule::pipeline("redgifs", &[r"redgifs\.com(?:/|\\/)ifr"], Redgifs)?,
        ResolverRule::transform(
            "cyberdrop",
            &[r"fs-\d+\.cyberdrop\.(?:me|to|cc|nl)/", r"cyberdrop\.(?:me|to|cc|nl)/a/"],
            transform::cyberdrop_node,
        )?,
        ResolverRule::pipeline("cyberdrop album", &[r"cyberdrop\.(?:me|to|cc|nl)/a/"], CyberdropAlbum)?,
        ResolverRule::pipeline("noodlemagazine", &[r"noodlemagazine\.com/watch/"], Noodlemagazine)?,
        ResolverRule::pipeline("spankbang", &[r"spankbang\.com/.*?/video"], Spankbang)?,
        ResolverRule::pipeline("imagebam", &[r"imagebam\.com/(?:view|gallery)"], Imagebam)?,
        ResolverRule::pipeline(
            "img.kiwi",
            &[r"img\.kiwi/image/", r"img\.kiwi/album/"],
            PageAttr::new(r#"meta[property="og:image"]"#, "content"),
        )?,
        ResolverRule::pipeline(
            "img.kiwi album",
            &[r"img\.kiwi/album/"],
            ImageAlbum::single_page(".image-container > img"),
        )?,
        ResolverRule::transform("simpcity", &[r"simpcity\.su/attachments"], transform::identity)?,
        ResolverRule::transform(
            "imgbox",
            &[r"(?:thumbs|images)\d*\.imgbox\.com/", r"imgbox\.com/g/"],
            transform::imgbox_full_size,
        )?,
        ResolverRule::pipeline("imgbox gallery", &[r"imgbox\.com/g/"], ImgboxGallery)?,
        ResolverRule::pipeline("gfycat", &[r"gfycat\.com(?:/|\\/)"], Gfycat)?,
        ResolverRule::pipeline("box.com", &[r"m\.box\.com/"], BoxFolder)?,
        ResolverRule::pipeline(
            "imgur",
            &[r"imgur\.min\.|imgur\.(?:com|io)", r"\w+\.imgur\.(?:com|io)"],
            Imgur,
        )?,
        ResolverRule::transform("imgur direct", &[r"\w+\.imgur\.(?:com|io)"], transform::identity)?,
        ResolverRule::transform("twimg", &[r"twimg\.com/"], transform::twimg_original)?,
        ResolverRule::pipeline("yandex", &[r"(?:disk\.)?yandex\.[a-z]+"], YandexDisk)?,
        ResolverRule::pipeline("instagram embed", &[r"instagram\.min"], InstagramEmbed)?,
        ResolverRule::pipeline(
            "instagram profile",
            &[r"instagram\.com/[a-zA-Z0-9_.-]+|(?:(?:instagram|insta):\s*)@?[a-zA-Z0-9_.-]+"],
            InstagramProfile,
        )?,
        ResolverRule::transform("reddit", &[r"(?:\w+)?\.redd\.it"], transform::identity)?,
    ])
}
