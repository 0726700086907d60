//! Init script that makes an automated Chromium look like a regular one.

use harvest_engine::StealthProfile;

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Builds the script evaluated on every new document before page scripts run.
pub fn init_script(profile: &StealthProfile) -> String {
    let languages = serde_json::Value::from(profile.languages.clone()).to_string();
    let mut script = format!(
        r#"(() => {{
const define = (target, key, value) => Object.defineProperty(target, key, {{ get: () => value, configurable: true }});
define(navigator, 'webdriver', false);
define(navigator, 'languages', {languages});
define(navigator, 'vendor', {vendor});
define(navigator, 'platform', {platform});
window.chrome = window.chrome || {{ runtime: {{}} }};
const spoof = (proto) => {{
  const original = proto.getParameter;
  proto.getParameter = function (parameter) {{
    if (parameter === 37445) return {webgl_vendor};
    if (parameter === 37446) return {renderer};
    return original.apply(this, arguments);
  }};
}};
spoof(WebGLRenderingContext.prototype);
if (typeof WebGL2RenderingContext !== 'undefined') spoof(WebGL2RenderingContext.prototype);
"#,
        languages = languages,
        vendor = js_string(&profile.vendor),
        platform = js_string(&profile.platform),
        webgl_vendor = js_string(&profile.webgl_vendor),
        renderer = js_string(&profile.renderer),
    );

    // Headless Chromium reports a zero-height image for a 1px border.
    if profile.fix_hairline {
        script.push_str(
            r#"const hairline = Object.getOwnPropertyDescriptor(HTMLElement.prototype, 'offsetHeight');
Object.defineProperty(HTMLDivElement.prototype, 'offsetHeight', {
  get: function () {
    if (this.id === 'modernizr') return 1;
    return hairline.get.apply(this);
  },
  configurable: true,
});
"#,
        );
    }

    script.push_str("})();");
    script
}

/// Strips the headless marker from a browser-reported user agent.
pub fn user_agent(reported: &str) -> String {
    reported.replace("HeadlessChrome", "Chrome")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_carries_profile_values() {
        let script = init_script(&StealthProfile::default());
        assert!(script.contains(r#"define(navigator, 'languages', ["en-US","en"]);"#));
        assert!(script.contains(r#"define(navigator, 'platform', "Win32");"#));
        assert!(script.contains(r#"return "Intel Iris OpenGL Engine";"#));
        assert!(script.contains("modernizr"));
        assert!(script.ends_with("})();"));
    }

    #[test]
    fn hairline_fix_is_optional() {
        let profile = StealthProfile {
            fix_hairline: false,
            vendor: "Quote \"Inc\"".to_string(),
            ..Default::default()
        };
        let script = init_script(&profile);
        assert!(!script.contains("modernizr"));
        assert!(script.contains(r#""Quote \"Inc\"""#));
    }

    #[test]
    fn user_agent_drops_headless_marker() {
        assert_eq!(
            user_agent("Mozilla/5.0 HeadlessChrome/120.0.0.0 Safari/537.36"),
            "Mozilla/5.0 Chrome/120.0.0.0 Safari/537.36"
        );
    }
}
