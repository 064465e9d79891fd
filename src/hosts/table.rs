use once_cell::sync::Lazy;
use std::sync::Arc;

use super::signature::HostSignature;

/// Builtin host signatures: `(signature, single matcher, album matcher)`.
///
/// Order is significant only for output order of a scan.
const BUILTIN_HOSTS: &[(&str, &str, Option<&str>)] = &[
    ("simpcity.su:Attachments", r"simpcity\.su/attachments", None),
    ("anonfiles.com:", r"anonfiles\.com", None),
    (
        "jpg.church:image",
        r"simp\d+\.jpg\.church/",
        Some(r"jpg\.church/a/[~an@_.-]+<no_qs>"),
    ),
    (
        "ibb.co:image",
        r#"!!(?P<res>https?://(?:www\.)?(?:[a-z](?:\d+)?\.)?ibb\.co/[~an@_.-]+)""#,
        Some(r"ibb\.co/album/[~an@_.-]+"),
    ),
    ("img.kiwi:image", r"img\.kiwi/image/", Some(r"img\.kiwi/album/")),
    (
        "imgbox.com:image",
        r"(?:thumbs|images)(?:\d+)?\.imgbox\.com/",
        Some(r"imgbox\.com/g/"),
    ),
    (
        "imgur.com:Media",
        r#"!!(?P<res>https:(?:/|\\/){2}s9e\.github\.io(?:/|\\/)iframe(?:/|\\/)2(?:/|\\/)imgur[^"]*?)(?:"|&quot;)|"(?P<res2>https://(?:www\.)?imgur\.(?:com|io)[^"]*?)""#,
        None,
    ),
    ("imgur.com:image", r"\w+\.imgur\.(?:com|io)", None),
    ("reddit.com:image", r"(?:\w+)?\.redd\.it", None),
    (
        "instagram.com:Media",
        r#"!!(?P<res>https:(?:/|\\/){2}s9e\.github\.io(?:/|\\/)iframe(?:/|\\/)2(?:/|\\/)instagram[^"]*?)(?:"|&quot;)"#,
        None,
    ),
    (
        "instagram.com:Profile",
        r"!!instagram\.com/[~an@_.-]+|(?:(?:instagram|insta):\s*)@?[a-zA-Z0-9_.-]+",
        None,
    ),
    ("twitter.com:image", r"(?:[~an@.]+)?twimg\.com/", None),
    (
        "pixl.is:image",
        r"(?:[a-z]\d+\.)pixl\.(?:is|to)/(?:(?:img|image)/)?",
        Some(r"pixl\.(?:is|to)/album/"),
    ),
    (
        "pixhost.to:image",
        r"t(?:\d+)?\.pixhost\.to/",
        Some(r"pixhost\.to/gallery/"),
    ),
    ("imagebam.com:image", r"imagebam\.com/(?:view|gallery)", None),
    (
        "saint.to:video",
        r"(?:saint\.to/embed/|(?:[~an@]+\.)?saint\.to/videos)",
        None,
    ),
    (
        "redgifs.com:video",
        r#"!!(?P<res>redgifs\.com(?:/|\\/)ifr[^"]*?)(?:"|&quot;)"#,
        None,
    ),
    (
        "gfycat.com:video",
        r#"!!(?P<res>gfycat\.com(?:/|\\/)ifr[^"]*?)(?:"|&quot;)"#,
        None,
    ),
    (
        "bunkr.is:",
        r"(?:stream|cdn(?:\d+)?|i(?:\d+)?)\.bunkr\.is/(?:v/)?",
        Some(r"bunkr\.is/a/"),
    ),
    ("pixeldrain.com:", r"pixeldrain\.com/[lu]/", None),
    ("gofile.io:", r"gofile\.io/d", None),
    ("erome.com:", r"erome\.com/a/", None),
    ("box.com:", r"m\.box\.com/", None),
    ("yandex.ru:", r"(?:disk\.)?yandex\.[a-z]+", None),
    (
        "cyberfile.is:",
        r#"!!(?P<res>https://cyberfile\.is/\w+)""#,
        Some(r"cyberfile\.is/folder/"),
    ),
    (
        "cyberdrop.me:",
        r"fs-\d+\.cyberdrop\.(?:me|to|cc|nl)/",
        Some(r"cyberdrop\.(?:me|to|cc|nl)/a/"),
    ),
    ("pornhub.com:video", r"(?:[~an@]+\.)?pornhub\.com/view_video", None),
    (
        "noodlemagazine.com:video",
        r"(?:adult\.)?noodlemagazine\.com/watch/",
        None,
    ),
    ("spankbang.com:video", r#"spankbang\.com/[^"]*?/video"#, None),
];

static BUILTIN: Lazy<HostTable> = Lazy::new(|| {
    HostTable::new(
        BUILTIN_HOSTS
            .iter()
            .map(|(signature, single, album)| HostSignature::new(signature, single, *album))
            .collect(),
    )
});

/// Ordered, immutable set of host signatures
#[derive(Debug, Clone)]
pub struct HostTable {
    signatures: Vec<Arc<HostSignature>>,
}

impl HostTable {
    pub fn new(signatures: Vec<HostSignature>) -> Self {
        Self {
            signatures: signatures.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn builtin() -> &'static HostTable {
        &BUILTIN
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<HostSignature>> {
        self.signatures.iter()
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Case-insensitive lookup by host name (several signatures may share one)
    pub fn contains_name(&self, name: &str) -> bool {
        self.signatures
            .iter()
            .any(|sig| sig.name.eq_ignore_ascii_case(name))
    }
}
