use rand::Rng;

const CHROME_VERSIONS: [&str; 12] = [
    "133.0.6943.88", "133.0.6943.60", "132.0.6834.110", "132.0.6834.83", "131.0.6778.108",
    "131.0.6778.85", "130.0.6723.117", "129.0.6668.89", "128.0.6613.138", "127.0.6533.119",
    "126.0.6478.182", "125.0.6422.176",
];

const FIREFOX_VERSIONS: [&str; 8] = [
    "133.0", "132.0", "131.0", "130.0", "129.0", "128.0", "127.0", "126.0",
];

const EDGE_VERSIONS: [&str; 6] = [
    "133.0.3048.56", "132.0.2957.63", "131.0.2903.112", "130.0.2849.80", "129.0.2792.65",
    "128.0.2739.90",
];

const SAFARI_VERSIONS: [&str; 5] = ["18.2", "18.1", "18.0", "17.7", "17.6"];

/// 只放桌面版，行動版的 UA 對 Yahoo 會回傳不同格式的頁面
const DESKTOP_OS: [&str; 10] = [
    "Windows NT 10.0; Win64; x64",
    "Windows NT 10.0; Win64; x64",
    "Windows NT 10.0; Win64; x64",
    "Windows NT 10.0; WOW64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "Macintosh; Intel Mac OS X 14_7_1",
    "Macintosh; Intel Mac OS X 15_2",
    "X11; Linux x86_64",
    "X11; Ubuntu; Linux x86_64",
    "X11; Fedora; Linux x86_64",
];

fn pick<'a>(items: &[&'a str]) -> &'a str {
    items[rand::rng().random_range(0..items.len())]
}

fn gen_chrome_ua() -> String {
    format!(
        "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
        pick(&DESKTOP_OS),
        pick(&CHROME_VERSIONS)
    )
}

fn gen_firefox_ua() -> String {
    let version = pick(&FIREFOX_VERSIONS);
    format!(
        "Mozilla/5.0 ({}; rv:{}) Gecko/20100101 Firefox/{}",
        pick(&DESKTOP_OS),
        version,
        version
    )
}

fn gen_edge_ua() -> String {
    let version = pick(&EDGE_VERSIONS);
    let chromium = version.split('.').next().unwrap_or("133");
    format!(
        "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{}.0.0.0 Safari/537.36 Edg/{}",
        pick(&DESKTOP_OS[..4]),
        chromium,
        version
    )
}

fn gen_safari_ua() -> String {
    format!(
        "Mozilla/5.0 ({}) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/{} Safari/605.1.15",
        pick(&DESKTOP_OS[4..7]),
        pick(&SAFARI_VERSIONS)
    )
}

/// 依大致的市佔率隨機產生一組瀏覽器 UA
pub fn gen_random_ua() -> String {
    match rand::rng().random_range(0..10) {
        0..=4 => gen_chrome_ua(),
        5..=6 => gen_firefox_ua(),
        7..=8 => gen_edge_ua(),
        _ => gen_safari_ua(),
    }
}

/// 產生 `size` 組 UA 當作輪替用的清單
pub fn gen_pool(size: usize) -> Vec<String> {
    (0..size.max(1)).map(|_| gen_random_ua()).collect()
}
