/// 解析瀏覽器複製下來的 Cookie 字串，保留原本順序。
///
/// 以 `;` 分隔，略過空白或不含 `=` 的片段，只在第一個 `=` 切開。
pub fn parse_cookie_string(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

pub fn to_cookie_header(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("; ")
}
